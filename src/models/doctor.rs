use serde::{Deserialize, Serialize};

use crate::records::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub email: String,
    pub specialty: String,
    pub department: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl Record for Doctor {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.email.as_str(),
            self.specialty.as_str(),
            self.department.as_str(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub head: Option<String>,
    #[serde(default)]
    pub beds: u32,
}

impl Record for Department {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        match &self.head {
            Some(head) => vec![self.name.as_str(), head.as_str()],
            None => vec![self.name.as_str()],
        }
    }
}
