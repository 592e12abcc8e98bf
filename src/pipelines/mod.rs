//! Render pipeline definitions.
//!
//! - [`Shader`] is a named WGSL source shared between materials
//! - `phong` describes the vertex streams, bindings and fixed state of the
//!   lit pipeline and builds it on a wgpu device

use std::{fmt, sync::Arc};

pub mod phong;

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// WGSL shader source with a debug label.
///
/// Cloning only bumps reference counts. The module must expose
/// [`VERTEX_ENTRY`] and [`FRAGMENT_ENTRY`].
#[derive(Clone, PartialEq, Eq)]
pub struct Shader {
    label: Arc<str>,
    source: Arc<str>,
}

impl Shader {
    pub fn new(label: impl Into<Arc<str>>, source: impl Into<Arc<str>>) -> Self {
        Self {
            label: label.into(),
            source: source.into(),
        }
    }

    /// The built-in Phong shader.
    pub fn phong() -> Self {
        Self::new("Phong Shader", include_str!("phong.wgsl"))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for Shader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shader")
            .field("label", &self.label)
            .field("source_len", &self.source.len())
            .finish()
    }
}
