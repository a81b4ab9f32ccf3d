/// Line scanner — sequential single-pass reader over script text.

/// Yields one raw line at a time (line terminators stripped, content
/// untouched) and tracks the 1-based number of the last line read.
#[derive(Debug, Clone)]
pub struct LineScanner<'a> {
    lines: std::str::Lines<'a>,
    line_number: usize,
}

impl<'a> LineScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
            line_number: 0,
        }
    }

    /// Read the next line, or `None` once the text is exhausted.
    pub fn next_line(&mut self) -> Option<&'a str> {
        let line = self.lines.next()?;
        self.line_number += 1;
        Some(line)
    }

    /// Number of the line most recently returned by [`next_line`](Self::next_line).
    /// Zero before the first read.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<'a> Iterator for LineScanner<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line()
    }
}
