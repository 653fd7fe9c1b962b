//! Scan report and clean request types.

use crate::category::{Category, Section};
use crate::tree::CleanNode;
use serde::{Deserialize, Serialize};

/// Report of reclaimable artifacts, grouped into four sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanReport {
    pub system_clean: Vec<CleanNode>,
    pub upload_clean: Vec<CleanNode>,
    pub download_clean: Vec<CleanNode>,
    pub system_log_clean: Vec<CleanNode>,
}

impl CleanReport {
    pub fn section(&self, section: Section) -> &[CleanNode] {
        match section {
            Section::System => &self.system_clean,
            Section::Upload => &self.upload_clean,
            Section::Download => &self.download_clean,
            Section::Log => &self.system_log_clean,
        }
    }

    pub fn sections(&self) -> impl Iterator<Item = (Section, &[CleanNode])> {
        [Section::System, Section::Upload, Section::Download, Section::Log]
            .into_iter()
            .map(move |s| (s, self.section(s)))
    }

    pub fn total_bytes(&self) -> u64 {
        self.sections()
            .flat_map(|(_, nodes)| nodes.iter())
            .map(|n| n.size_bytes)
            .sum()
    }

    /// Group node of a category, looked up in the section it belongs to.
    /// Sub-groups of the system section sit one level down.
    pub fn top_level(&self, category: Category) -> Option<&CleanNode> {
        let nodes = self.section(category.section());
        nodes
            .iter()
            .chain(nodes.iter().flat_map(|n| n.children.iter()))
            .find(|n| n.category == category && n.name.is_empty())
    }

    /// Selection matching the report's default checkbox state.
    ///
    /// Checkboxes cascade like a tree widget: a ticked node ticks its whole
    /// subtree, and a node whose children are all ticked counts as ticked.
    /// The highest ticked nodes are emitted, so a fully ticked group becomes
    /// one coarse item instead of one item per file.
    pub fn default_selection(&self) -> Vec<CleanSelection> {
        let mut selection = Vec::new();
        for (_, nodes) in self.sections() {
            for node in nodes {
                collect_selected(node, &mut selection);
            }
        }
        selection
    }
}

fn ticked(node: &CleanNode) -> bool {
    node.is_selected_by_default || (!node.is_leaf() && node.children.iter().all(ticked))
}

fn collect_selected(node: &CleanNode, out: &mut Vec<CleanSelection>) {
    if ticked(node) {
        // An empty group has nothing to reclaim
        if node.name.is_empty() && node.is_leaf() && node.size_bytes == 0 {
            return;
        }
        out.push(CleanSelection::from(node));
        return;
    }
    for child in &node.children {
        collect_selected(child, out);
    }
}

/// One item of a clean request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanSelection {
    pub category: Category,
    #[serde(default)]
    pub name: String,
    /// Echoed from the report; used for statistics only
    #[serde(default, alias = "size")]
    pub size_bytes: u64,
}

impl CleanSelection {
    pub fn new(category: Category, name: &str, size_bytes: u64) -> Self {
        Self {
            category,
            name: name.to_string(),
            size_bytes,
        }
    }
}

impl From<&CleanNode> for CleanSelection {
    fn from(node: &CleanNode) -> Self {
        Self::new(node.category, &node.name, node.size_bytes)
    }
}
