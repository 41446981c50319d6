// src/utils.rs

use std::collections::BTreeSet;

/// 按显示宽度截断，全角字符按 2 计
pub fn truncate_text(text: &str, max_width: usize) -> String {
    let char_width = |c: char| if c.is_ascii() { 1 } else { 2 };
    if text.chars().map(char_width).sum::<usize>() <= max_width {
        return text.to_string();
    }

    let budget = max_width.saturating_sub(3);
    let mut width = 0;
    let mut end = 0;
    for (i, c) in text.char_indices() {
        width += char_width(c);
        if width > budget {
            break;
        }
        end = i + c.len_utf8();
    }
    format!("{}...", &text[..end])
}

/// 解析 "1,3,5-7" 或 "all" 形式的选择，返回从 0 开始的有序下标
pub fn parse_selection_indices(selection: &str, total: usize) -> Vec<usize> {
    if selection.trim().eq_ignore_ascii_case("all") {
        return (0..total).collect();
    }

    let in_range = |n: usize| n >= 1 && n <= total;
    let mut indices = BTreeSet::new();
    for part in selection.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let (Ok(start), Ok(end)) = (start.trim().parse::<usize>(), end.trim().parse::<usize>())
                else {
                    continue;
                };
                let (low, high) = (start.min(end), start.max(end));
                indices.extend((low..=high).filter(|n| in_range(*n)).map(|n| n - 1));
            }
            None => {
                if let Ok(n) = part.parse::<usize>() {
                    if in_range(n) {
                        indices.insert(n - 1);
                    }
                }
            }
        }
    }
    indices.into_iter().collect()
}

pub fn format_duration(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    match (total / 3600, total % 3600 / 60, total % 60) {
        (0, 0, s) => format!("{}秒", s),
        (0, m, s) => format!("{}分{}秒", m, s),
        (h, m, s) => format!("{}时{}分{}秒", h, m, s),
    }
}
