//! Command-line arguments.

use clap::Parser;

#[derive(Parser, Clone, Debug, PartialEq)]
#[command(name = "glyphpack")]
#[command(about = "Build a glyph atlas for one font and log what was packed")]
#[command(version)]
pub struct CliArgs {
    /// Font family name or CSS-style family list
    pub family: String,

    /// Point size
    pub size: f32,

    /// Square page limit in pixels (library default when absent)
    pub max_page: Option<u32>,

    /// Characters to pack (default ASCII set when absent)
    pub chars: Option<String>,

    /// Use box glyphs instead of system fonts
    #[arg(long)]
    pub synthetic: bool,
}
