/// The expression being composed. Tokens are accepted as-is: nothing is
/// validated, balanced or tokenized before it is sent to the solver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expression {
    text: String,
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// True when there is nothing worth submitting.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn append(&mut self, token: &str) {
        self.text.push_str(token);
    }

    pub fn push(&mut self, c: char) {
        self.text.push(c);
    }

    /// Remove the last character. No-op on an empty expression.
    pub fn delete_last(&mut self) {
        self.text.pop();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Overwrite with a recalled expression.
    pub fn replace(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_then_delete_same_count_is_empty() {
        let mut expr = Expression::new();
        for token in ["sin(", "pi", "/", "2", ")", "∫ ", "d/dx "] {
            expr.append(token);
        }
        let n = expr.char_count();
        for _ in 0..n {
            expr.delete_last();
        }
        assert!(expr.is_empty());
    }

    #[test]
    fn test_delete_on_empty_is_noop() {
        let mut expr = Expression::new();
        expr.delete_last();
        assert_eq!(expr.as_str(), "");
    }

    #[test]
    fn test_delete_removes_one_multibyte_char() {
        let mut expr = Expression::new();
        expr.append("2∫");
        expr.delete_last();
        assert_eq!(expr.as_str(), "2");
    }

    #[test]
    fn test_malformed_input_kept_verbatim() {
        let mut expr = Expression::new();
        expr.append("((");
        expr.append("+*");
        expr.push('x');
        assert_eq!(expr.as_str(), "((+*x");
    }

    #[test]
    fn test_blank_and_clear() {
        let mut expr = Expression::new();
        expr.append("   ");
        assert!(expr.is_blank());
        assert!(!expr.is_empty());
        expr.clear();
        assert!(expr.is_empty());
    }

    #[test]
    fn test_replace_overwrites() {
        let mut expr = Expression::new();
        expr.append("1+");
        expr.replace("y=x^2");
        assert_eq!(expr.as_str(), "y=x^2");
    }
}
