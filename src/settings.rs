use std::str::FromStr;

/// Errors for the few string surfaces of the crate (kernel messages,
/// persisted settings).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown run status `{0}`")]
    RunStatus(String),
    #[error("unknown layout direction `{0}`, expected `TB` or `LR`")]
    Direction(String),
    #[error("unknown ranker `{0}`, expected `longest-path` or `tight-tree`")]
    Ranker(String),
}

/// Knobs for building graph elements.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GraphSettings {
    /// Drop cells that only render markdown and take part in no edge (tree mode).
    pub hide_pure_markdown: bool,
    /// Call that marks a markdown-only cell.
    pub markdown_prefix: String,
    /// Name the host binds its UI library to in every cell. Ignored when
    /// deriving tree edges so it does not turn into a hub.
    pub ambient_identifier: Option<String>,
    pub line_height: f32,
    pub node_padding: f32,
    pub max_node_height: f32,
    /// Vertical gap between stacked minimap nodes.
    pub node_gap: f32,
    pub node_width: f32,
    pub tree_node_height: f32,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            hide_pure_markdown: false,
            markdown_prefix: "mo.md".to_owned(),
            ambient_identifier: Some("mo".to_owned()),
            line_height: 11.0,
            node_padding: 20.0,
            max_node_height: 200.0,
            node_gap: 20.0,
            node_width: 250.0,
            tree_node_height: 60.0,
        }
    }
}

impl GraphSettings {
    pub fn hide_pure_markdown(mut self, hide: bool) -> Self {
        self.hide_pure_markdown = hide;
        self
    }

    pub fn markdown_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.markdown_prefix = prefix.into();
        self
    }

    pub fn ambient_identifier(mut self, identifier: Option<&str>) -> Self {
        self.ambient_identifier = identifier.map(str::to_owned);
        self
    }

    pub fn node_width(mut self, width: f32) -> Self {
        self.node_width = width.max(1.0);
        self
    }

    pub fn node_gap(mut self, gap: f32) -> Self {
        self.node_gap = gap.max(0.0);
        self
    }

    /// Minimap height for a cell with `lines` lines of code.
    pub fn minimap_height(&self, lines: usize) -> f32 {
        (lines as f32 * self.line_height + self.node_padding).min(self.max_node_height)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayoutDirection {
    #[default]
    TopToBottom,
    LeftToRight,
}

impl FromStr for LayoutDirection {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TB" | "top-to-bottom" => Ok(Self::TopToBottom),
            "LR" | "left-to-right" => Ok(Self::LeftToRight),
            other => Err(ParseError::Direction(other.to_owned())),
        }
    }
}

impl std::fmt::Display for LayoutDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TopToBottom => f.write_str("TB"),
            Self::LeftToRight => f.write_str("LR"),
        }
    }
}

/// How ranks are assigned before nodes are ordered within a rank.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Ranker {
    /// Every node sits one rank below its deepest input.
    #[default]
    LongestPath,
    /// Like `LongestPath`, then producers are pulled down next to their
    /// closest consumer.
    TightTree,
}

impl FromStr for Ranker {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "longest-path" => Ok(Self::LongestPath),
            "tight-tree" => Ok(Self::TightTree),
            other => Err(ParseError::Ranker(other.to_owned())),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LayoutConfig {
    pub direction: LayoutDirection,
    /// Minimum gap between ranks, in points.
    pub rank_sep: f32,
    /// Minimum gap between neighbours within a rank, in points.
    pub node_sep: f32,
    pub ranker: Ranker,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            direction: LayoutDirection::TopToBottom,
            rank_sep: 50.0,
            node_sep: 30.0,
            ranker: Ranker::LongestPath,
        }
    }
}

impl LayoutConfig {
    pub fn direction(mut self, direction: LayoutDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn rank_sep(mut self, rank_sep: f32) -> Self {
        self.rank_sep = rank_sep.max(0.0);
        self
    }

    pub fn node_sep(mut self, node_sep: f32) -> Self {
        self.node_sep = node_sep.max(0.0);
        self
    }

    pub fn ranker(mut self, ranker: Ranker) -> Self {
        self.ranker = ranker;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimap_height_is_capped() {
        let settings = GraphSettings::default();
        assert_eq!(settings.minimap_height(1), 31.0);
        assert_eq!(settings.minimap_height(100), 200.0);
    }

    #[test]
    fn parses_direction_and_ranker() {
        assert_eq!("LR".parse(), Ok(LayoutDirection::LeftToRight));
        assert_eq!("tight-tree".parse(), Ok(Ranker::TightTree));
        assert_eq!(
            "sideways".parse::<LayoutDirection>(),
            Err(ParseError::Direction("sideways".to_owned()))
        );
    }
}
