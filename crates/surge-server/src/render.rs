//! Plain-text rendering for the CLI subcommands.

use std::fmt::Write as _;

use surge_core::{
  category::CategoryRegistry,
  detector::{Growth, ScoredItem, TrendAnalysis},
};

/// `NEW` for items without a baseline, otherwise a signed percentage.
pub fn growth_label(growth: &Growth) -> String {
  match growth {
    Growth::New => "NEW".to_owned(),
    Growth::Established { percent } => format!("{percent:+.1}%"),
  }
}

/// One line per ranked item, numbered from 1.
pub fn trending_table(
  registry: &CategoryRegistry,
  category: &str,
  items: &[ScoredItem],
) -> String {
  let name = registry.display_name(category);
  if items.is_empty() {
    return format!("No trending items in {name}.\n");
  }

  let mut out = format!("Trending in {name}:\n");
  for (idx, scored) in items.iter().enumerate() {
    let _ = writeln!(
      out,
      "{:>3}. {:>9}  {:>7} uses (was {:>6})  {} by {}",
      idx + 1,
      growth_label(&scored.growth),
      scored.item.uses_count,
      scored.old_uses_count,
      scored.item.title,
      scored.item.author,
    );
  }
  out
}

pub fn analysis_summary(registry: &CategoryRegistry, analysis: &TrendAnalysis) -> String {
  let mut out = format!("{}\n", registry.display_name(&analysis.category));
  let _ = writeln!(out, "  trending items: {}", analysis.trending_count);
  let _ = writeln!(out, "  new items:      {}", analysis.new_count);
  match analysis.average_growth {
    Some(avg) => {
      let _ = writeln!(out, "  average growth: {avg:+.1}%");
    }
    None => {
      let _ = writeln!(out, "  average growth: n/a");
    }
  }
  if let Some(top) = &analysis.top_item {
    let _ = writeln!(
      out,
      "  top item:       {} by {} ({})",
      top.item.title,
      top.item.author,
      growth_label(&top.growth),
    );
  }
  out
}
