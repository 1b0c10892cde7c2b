use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::material::Material;
use crate::tool::Tool;

/// The tool library, loaded from a TOML file with a `[[tools]]` table per
/// entry. The pipeline takes a snapshot at run start and never mutates it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolLibrary {
    #[serde(default)]
    pub tools: Vec<Tool>,
}

impl ToolLibrary {
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, Error> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn add(&mut self, tool: Tool) {
        self.tools.push(tool);
    }

    pub fn find(&self, id: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.id == id)
    }

    pub fn get(&self, id: &str) -> Result<&Tool, Error> {
        self.find(id).ok_or_else(|| Error::ToolNotFound(id.into()))
    }

    /// Immutable copy handed to a pipeline run.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// A small default set covering every canonical operation.
    pub fn standard() -> Self {
        Self {
            tools: vec![
                Tool::general_turning(),
                Tool::boring_bar(),
                Tool::center_drill(6.0),
                Tool::grooving_insert(2.5),
                Tool::threading_insert(),
                Tool::parting_blade(),
            ],
        }
    }
}

/// The material library, same storage and snapshot rules as the tool
/// library.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialLibrary {
    #[serde(default)]
    pub materials: Vec<Material>,
}

impl MaterialLibrary {
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, Error> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn find(&self, id: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.id == id)
    }

    pub fn get(&self, id: &str) -> Result<&Material, Error> {
        self.find(id).ok_or_else(|| Error::MaterialNotFound(id.into()))
    }

    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    pub fn standard() -> Self {
        Self {
            materials: vec![
                Material::mild_steel(),
                Material::aluminium_6061(),
                Material::brass_360(),
            ],
        }
    }
}
