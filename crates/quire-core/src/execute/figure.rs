//! Figure tracking for opaque plotting calls.
//!
//! Plotting libraries are not modelled. A call whose name is a configured
//! figure trigger opens a figure; later library calls are recorded on it
//! until it is shown or the cell ends, at which point it becomes a
//! [`FigureArtifact`] holding an SVG summary of those calls.

use crate::state::FigureArtifact;

const SVG_WIDTH: usize = 640;
const LINE_HEIGHT: usize = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenFigure {
    label: String,
    calls: Vec<String>,
}

/// Figure bookkeeping kept in the execution context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FigureState {
    open: Option<OpenFigure>,
    /// Figures produced so far in this run
    produced: u32,
}

impl FigureState {
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Number of figures produced so far.
    pub fn produced(&self) -> u32 {
        self.produced
    }

    /// Open a figure labelled by the call that created it.
    pub fn open(&mut self, label: &str) {
        if self.open.is_none() {
            self.open = Some(OpenFigure {
                label: label.to_string(),
                calls: Vec::new(),
            });
        }
    }

    /// Record a library call on the open figure, if any.
    pub fn record(&mut self, call: &str) {
        if let Some(figure) = self.open.as_mut() {
            figure.calls.push(call.to_string());
        }
    }

    /// Close the open figure and render it.
    pub fn close(&mut self) -> Option<FigureArtifact> {
        let figure = self.open.take()?;
        Some(self.render(figure))
    }

    /// Render a figure for a show call with nothing open.
    pub fn render_standalone(&mut self, label: &str) -> FigureArtifact {
        self.render(OpenFigure {
            label: label.to_string(),
            calls: vec![label.to_string()],
        })
    }

    /// Drop the open figure without producing an artifact.
    pub fn discard(&mut self) {
        if let Some(figure) = self.open.take() {
            tracing::debug!("Discarding unfinished figure {}", figure.label);
        }
    }

    fn render(&mut self, figure: OpenFigure) -> FigureArtifact {
        self.produced += 1;
        let data = render_svg(&figure.label, &figure.calls);
        FigureArtifact {
            id: self.produced,
            label: figure.label,
            calls: figure.calls,
            mime: "image/svg+xml".to_string(),
            data,
        }
    }
}

fn render_svg(label: &str, calls: &[String]) -> String {
    let height = 48 + LINE_HEIGHT * calls.len();
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{SVG_WIDTH}\" height=\"{height}\" viewBox=\"0 0 {SVG_WIDTH} {height}\">\n"
    );
    svg.push_str("  <rect width=\"100%\" height=\"100%\" fill=\"#ffffff\" stroke=\"#999999\"/>\n");
    svg.push_str(&format!(
        "  <text x=\"16\" y=\"28\" font-family=\"monospace\" font-size=\"14\">{}</text>\n",
        escape_xml(label)
    ));
    for (i, call) in calls.iter().enumerate() {
        svg.push_str(&format!(
            "  <text x=\"16\" y=\"{}\" font-family=\"monospace\" font-size=\"12\" fill=\"#555555\">{}</text>\n",
            52 + LINE_HEIGHT * i,
            escape_xml(call)
        ));
    }
    svg.push_str("</svg>\n");
    svg
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_record_close() {
        let mut figures = FigureState::default();
        figures.record("ignored()");
        figures.open("plt.subplots");
        figures.record("plt.subplots");
        figures.record("ax.set_xscale");

        let artifact = figures.close().unwrap();
        assert_eq!(artifact.id, 1);
        assert_eq!(artifact.label, "plt.subplots");
        assert_eq!(artifact.calls, vec!["plt.subplots", "ax.set_xscale"]);
        assert!(artifact.data.starts_with("<svg"));
        assert!(!figures.is_open());
        assert!(figures.close().is_none());
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut figures = FigureState::default();
        figures.open("a");
        assert_eq!(figures.close().unwrap().id, 1);
        assert_eq!(figures.render_standalone("v.show").id, 2);
        assert_eq!(figures.produced(), 2);
    }

    #[test]
    fn test_discard() {
        let mut figures = FigureState::default();
        figures.open("a");
        figures.discard();
        assert!(figures.close().is_none());
        assert_eq!(figures.produced(), 0);
    }

    #[test]
    fn test_svg_is_escaped() {
        let svg = render_svg("a<b>", &["x & y".to_string()]);
        assert!(svg.contains("a&lt;b&gt;"));
        assert!(svg.contains("x &amp; y"));
    }
}
