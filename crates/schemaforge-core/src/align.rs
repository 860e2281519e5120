use unicode_width::UnicodeWidthStr;

/// Align tab-separated definition fragments into columns.
///
/// Each fragment is trimmed; all but the last fragment of a line are padded to
/// the widest fragment at that tab position plus one space.
pub fn align_columns<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let split: Vec<Vec<&str>> = lines
        .iter()
        .map(|line| line.as_ref().split('\t').map(str::trim).collect())
        .collect();

    let mut widths: Vec<usize> = Vec::new();
    for fragments in &split {
        for (idx, fragment) in fragments.iter().enumerate() {
            let width = UnicodeWidthStr::width(*fragment);
            match widths.get_mut(idx) {
                Some(current) => *current = (*current).max(width),
                None => widths.push(width),
            }
        }
    }

    split
        .iter()
        .map(|fragments| {
            let last = fragments.len().saturating_sub(1);
            let mut line = String::new();
            for (idx, fragment) in fragments.iter().enumerate() {
                line.push_str(fragment);
                if idx < last {
                    let pad = widths[idx] + 1 - UnicodeWidthStr::width(*fragment);
                    line.extend(std::iter::repeat_n(' ', pad));
                }
            }
            line
        })
        .collect()
}
