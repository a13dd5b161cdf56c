use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
  preview::PreviewOptions,
  tree::{TreeError, TreeOptions},
};

/// Plain-data subset of [`TreeOptions`], as stored in a JSON settings file.
///
/// Missing keys fall back to the option defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeSettings {
  pub expanded: bool,
  /// `-1` for unlimited.
  pub depth: i32,
  pub enable_clickable_values: bool,
  pub stop_click_propagation: bool,
  pub preview_limit: usize,
  pub preview_string_limit: usize,
}

impl Default for TreeSettings {
  fn default() -> Self {
    let preview = PreviewOptions::default();
    Self {
      expanded: true,
      depth: -1,
      enable_clickable_values: false,
      stop_click_propagation: true,
      preview_limit: preview.limit,
      preview_string_limit: preview.string_limit,
    }
  }
}

impl TreeSettings {
  pub fn from_json_str(text: &str) -> Result<Self, TreeError> {
    let settings: Self = serde_json::from_str(text)?;
    settings.validate()?;
    Ok(settings)
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self, TreeError> {
    let text = fs::read_to_string(path.as_ref())?;
    Self::from_json_str(&text)
  }

  pub fn to_json_string(&self) -> Result<String, TreeError> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// Overlay these settings on `options`, keeping its handlers and services.
  pub fn apply(&self, options: TreeOptions) -> TreeOptions {
    TreeOptions {
      expanded: self.expanded,
      depth: self.depth,
      enable_clickable_values: self.enable_clickable_values,
      stop_click_propagation: self.stop_click_propagation,
      preview: PreviewOptions {
        limit: self.preview_limit,
        string_limit: self.preview_string_limit,
      },
      ..options
    }
  }

  fn validate(&self) -> Result<(), TreeError> {
    if self.depth < -1 {
      return Err(TreeError::InvalidArg(format!(
        "depth must be -1 (unlimited) or >= 0, got {}",
        self.depth
      )));
    }
    if self.preview_limit == 0 {
      return Err(TreeError::InvalidArg("preview_limit must be > 0".into()));
    }
    Ok(())
  }
}

impl From<&TreeOptions> for TreeSettings {
  fn from(options: &TreeOptions) -> Self {
    Self {
      expanded: options.expanded,
      depth: options.depth,
      enable_clickable_values: options.enable_clickable_values,
      stop_click_propagation: options.stop_click_propagation,
      preview_limit: options.preview.limit,
      preview_string_limit: options.preview.string_limit,
    }
  }
}
