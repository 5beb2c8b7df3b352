use super::technique::Feedback;
use std::collections::HashSet;

pub const NO_IMPROVEMENTS: &str = "No specific feedback available.";
pub const NO_POSITIVES: &str = "No specific positive observations.";

/// Markers that move an improvement to the front of the list
const PRIORITY_MARKERS: [&str; 3] = ["Improve", "Increase", "Synchronize"];

/// Turn the per-frame remarks of a whole video into the final lists
///
/// Improvements mentioning a priority marker move ahead of the rest
/// (stable), then both lists drop case-insensitive repeats keeping the
/// first occurrence. A video with no remarks at all gets one placeholder
/// line per list.
pub fn prioritize(feedback: Feedback) -> Feedback {
    if feedback.is_empty() {
        return Feedback {
            improvements: vec![NO_IMPROVEMENTS.to_string()],
            positives: vec![NO_POSITIVES.to_string()],
        };
    }

    let (mut improvements, others): (Vec<String>, Vec<String>) = feedback
        .improvements
        .into_iter()
        .partition(|item| is_priority(item));
    improvements.extend(others);

    Feedback {
        improvements: deduplicate(improvements),
        positives: deduplicate(feedback.positives),
    }
}

fn is_priority(item: &str) -> bool {
    PRIORITY_MARKERS.iter().any(|marker| item.contains(marker))
}

/// Drop items equal to an earlier one ignoring case, keeping order
pub fn deduplicate(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.to_lowercase()))
        .collect()
}
