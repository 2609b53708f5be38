// Virtual keypad: layout, highlight cursor and key presses

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Appends `insert` to the expression; `label` is what the key shows
    Token { label: &'static str, insert: &'static str },
    Clear,
    Backspace,
    Solve,
    ToggleFunctions,
}

impl Key {
    pub fn label(&self, alt: bool) -> &'static str {
        match self {
            Key::Token { label, .. } => *label,
            Key::Clear => "AC",
            Key::Backspace => "⌫",
            Key::Solve => "=",
            Key::ToggleFunctions => {
                if alt {
                    "123"
                } else {
                    "Func"
                }
            }
        }
    }
}

const fn token(label: &'static str, insert: &'static str) -> Key {
    Key::Token { label, insert }
}

const FUNCTION_ROW: [Key; 5] = [
    Key::ToggleFunctions,
    token("sin", "sin("),
    token("cos", "cos("),
    token("tan", "tan("),
    token("√", "sqrt("),
];

const CALCULUS_ROW: [Key; 5] = [
    Key::ToggleFunctions,
    token("d/dx", "d/dx "),
    token("∫", "∫ "),
    token("∑", "sum("),
    token("lim", "lim "),
];

const MAIN_GRID: [[Key; 4]; 5] = [
    [Key::Clear, token("(", "("), token(")", ")"), token("÷", "/")],
    [token("7", "7"), token("8", "8"), token("9", "9"), token("×", "*")],
    [token("4", "4"), token("5", "5"), token("6", "6"), token("-", "-")],
    [token("1", "1"), token("2", "2"), token("3", "3"), token("+", "+")],
    [token("0", "0"), token(".", "."), Key::Backspace, Key::Solve],
];

const VARIABLE_ROW: [Key; 9] = [
    token("x", "x"),
    token("y", "y"),
    token("^", "^"),
    token("pi", "pi"),
    token("e", "e"),
    token("!", "!"),
    token("log", "log"),
    token("ln", "ln"),
    token("abs", "abs"),
];

/// What pressing a key asks the controller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPress {
    Insert(&'static str),
    Clear,
    Backspace,
    Solve,
    /// Handled inside the keypad (page switch)
    Consumed,
}

#[derive(Debug, Default)]
pub struct Keypad {
    alt: bool,
    row: usize,
    col: usize,
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_alt(&self) -> bool {
        self.alt
    }

    pub fn rows(&self) -> Vec<&'static [Key]> {
        let function_row: &'static [Key] = if self.alt { &CALCULUS_ROW } else { &FUNCTION_ROW };
        let mut rows = vec![function_row];
        rows.extend(MAIN_GRID.iter().map(|r| r.as_slice()));
        rows.push(&VARIABLE_ROW);
        rows
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn highlighted(&self) -> Key {
        let rows = self.rows();
        rows[self.row][self.col]
    }

    pub fn move_up(&mut self) {
        self.row = self.row.saturating_sub(1);
        self.clamp_col();
    }

    pub fn move_down(&mut self) {
        self.row = (self.row + 1).min(self.rows().len() - 1);
        self.clamp_col();
    }

    pub fn move_left(&mut self) {
        self.col = self.col.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        let width = self.rows()[self.row].len();
        self.col = (self.col + 1).min(width - 1);
    }

    fn clamp_col(&mut self) {
        let width = self.rows()[self.row].len();
        self.col = self.col.min(width - 1);
    }

    pub fn press(&mut self) -> KeyPress {
        match self.highlighted() {
            Key::Token { insert, .. } => KeyPress::Insert(insert),
            Key::Clear => KeyPress::Clear,
            Key::Backspace => KeyPress::Backspace,
            Key::Solve => KeyPress::Solve,
            Key::ToggleFunctions => {
                self.alt = !self.alt;
                KeyPress::Consumed
            }
        }
    }
}
