use std::sync::Arc;

use once_cell::sync::Lazy;
use url::Url;

use crate::{
  dispatch::ValueClickHandler, models::Segment, propagation::ClickEvent, tree::TreeError,
  value::Value,
};

/// Request to show a link in a fresh browsing context.
///
/// The new context gets neither an opener handle nor a referrer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
  pub url: Url,
  pub target: &'static str,
  pub no_opener: bool,
  pub no_referrer: bool,
}

impl OpenRequest {
  pub fn new_context(url: Url) -> Self {
    Self {
      url,
      target: "_blank",
      no_opener: true,
      no_referrer: true,
    }
  }

  /// Window feature string, e.g. `noopener,noreferrer`.
  pub fn features(&self) -> String {
    let mut out = Vec::new();
    if self.no_opener {
      out.push("noopener");
    }
    if self.no_referrer {
      out.push("noreferrer");
    }
    out.join(",")
  }
}

pub trait LinkOpener: Send + Sync {
  fn open(&self, request: &OpenRequest) -> Result<(), TreeError>;
}

/// Hands the link to the platform's default browser, detached from us.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLinkOpener;

impl LinkOpener for SystemLinkOpener {
  fn open(&self, request: &OpenRequest) -> Result<(), TreeError> {
    open::that_detached(request.url.as_str())
      .map_err(|e| TreeError::Open(format!("failed to open {}: {e}", request.url)))
  }
}

/// Opens string values that are absolute `http`/`https` URLs.
#[derive(Clone)]
pub struct FollowLinkHandler {
  opener: Arc<dyn LinkOpener>,
}

impl FollowLinkHandler {
  pub fn new(opener: Arc<dyn LinkOpener>) -> Self {
    Self { opener }
  }

  pub fn system() -> Self {
    Self::new(Arc::new(SystemLinkOpener))
  }

  /// The segment's link, if its value is well-formed http(s) URL text.
  pub fn link_of(segment: &Segment) -> Option<Url> {
    match &segment.value {
      Value::String(s) if s.starts_with("http") => Url::parse(s)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https")),
      _ => None,
    }
  }
}

impl ValueClickHandler for FollowLinkHandler {
  fn can_handle(&self, segment: &Segment) -> Result<bool, TreeError> {
    Ok(Self::link_of(segment).is_some())
  }

  fn handle(&self, segment: &Segment, _event: Option<&ClickEvent>) -> Result<(), TreeError> {
    let url = Self::link_of(segment)
      .ok_or_else(|| TreeError::Handler(format!("{:?} is not a link", segment.path)))?;
    self.opener.open(&OpenRequest::new_context(url))
  }
}

/// Built-in value click handlers, used when none are configured.
pub static VALUE_CLICK_HANDLERS: Lazy<Vec<Arc<dyn ValueClickHandler>>> = Lazy::new(|| {
  vec![Arc::new(FollowLinkHandler::system()) as Arc<dyn ValueClickHandler>]
});

pub fn default_value_click_handlers() -> Vec<Arc<dyn ValueClickHandler>> {
  VALUE_CLICK_HANDLERS.iter().cloned().collect()
}
