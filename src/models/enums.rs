use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two menus the restaurant publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuKind {
    Food,
    Alcohol,
}

impl MenuKind {
    pub const ALL: [MenuKind; 2] = [MenuKind::Food, MenuKind::Alcohol];

    /// Food categories and dishes carry Marathi names alongside English ones
    pub fn requires_marathi_name(&self) -> bool {
        matches!(self, MenuKind::Food)
    }

    /// Whether dietary and special tags apply to items of this kind
    pub fn supports_dish_tags(&self) -> bool {
        matches!(self, MenuKind::Food)
    }

    pub fn upload_kind(&self) -> UploadKind {
        match self {
            MenuKind::Food => UploadKind::Dishes,
            MenuKind::Alcohol => UploadKind::Alcohol,
        }
    }
}

impl fmt::Display for MenuKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuKind::Food => write!(f, "food"),
            MenuKind::Alcohol => write!(f, "alcohol"),
        }
    }
}

impl FromStr for MenuKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "food" => Ok(MenuKind::Food),
            "alcohol" => Ok(MenuKind::Alcohol),
            _ => Err(format!("Invalid menu kind: {}", s)),
        }
    }
}

/// Display language for the public menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Mr,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::En => write!(f, "en"),
            Language::Mr => write!(f, "mr"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "mr" => Ok(Language::Mr),
            _ => Err(format!("Invalid language: {}", s)),
        }
    }
}

/// Object-store folder an uploaded image lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Dishes,
    Alcohol,
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadKind::Dishes => write!(f, "dishes"),
            UploadKind::Alcohol => write!(f, "alcohol"),
        }
    }
}

impl FromStr for UploadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dishes" => Ok(UploadKind::Dishes),
            "alcohol" => Ok(UploadKind::Alcohol),
            _ => Err(format!("Invalid upload type: {}", s)),
        }
    }
}
