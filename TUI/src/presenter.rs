// View model for the active result card

use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

use crate::chart::PlotView;
use crate::markdown;
use crate::solve::{ResultKind, SolveResult};

const RAW_FG: Color = Color::Rgb(171, 178, 191);

/// Everything the result panel draws, derived from one `SolveResult`.
pub struct ResultCard<'a> {
    pub final_answer: &'a str,
    pub remark: &'a str,
    pub solution: &'a str,
    pub kind: ResultKind,
    /// Present only for graphable results with finite samples
    pub plot: Option<PlotView>,
}

impl<'a> ResultCard<'a> {
    pub fn new(result: &'a SolveResult) -> Self {
        Self {
            final_answer: result.final_answer(),
            remark: result.benny_comment(),
            solution: result.solution_markdown(),
            kind: result.kind(),
            plot: result.plot_points().and_then(PlotView::new),
        }
    }

    pub fn has_chart(&self) -> bool {
        self.plot.is_some()
    }

    /// Solution text as styled lines, or verbatim when `raw` is set.
    pub fn solution_lines(&self, width: usize, raw: bool) -> Vec<Line<'static>> {
        if raw {
            return self
                .solution
                .lines()
                .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(RAW_FG))))
                .collect();
        }
        let elements = markdown::parse_markdown(self.solution);
        markdown::render_markdown(&elements, width)
    }
}
