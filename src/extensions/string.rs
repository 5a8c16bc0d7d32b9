pub trait ToFileToken {
    /// Returns a copy usable inside a frame file name: trimmed, with
    /// whitespace, commas and path separators replaced by `-`.
    fn to_file_token(&self) -> String;
}

impl ToFileToken for str {
    fn to_file_token(&self) -> String {
        self.trim()
            .chars()
            .map(|c| match c {
                c if c.is_whitespace() => '-',
                ',' | '/' | '\\' => '-',
                other => other,
            })
            .collect()
    }
}

impl ToFileToken for String {
    fn to_file_token(&self) -> String {
        self.as_str().to_file_token()
    }
}
