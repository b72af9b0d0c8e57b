// Project and agent directory models
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub project_name: String,
}

impl Agent {
    /// First letter of the name, upper-cased, for avatar badges.
    pub fn initial(&self) -> Option<char> {
        self.name.chars().next().map(|c| c.to_ascii_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial() {
        let agent = Agent {
            id: "a1".to_string(),
            name: "maria".to_string(),
            project_id: "p1".to_string(),
            project_name: "Siri".to_string(),
        };
        assert_eq!(agent.initial(), Some('M'));
    }
}
