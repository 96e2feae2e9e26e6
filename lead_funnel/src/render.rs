use log::debug;

use crate::color::{stage_color, Rgb};
use crate::config::*;
use crate::{conversion_rate, format_count};

/// A piece of text placed in chart coordinates.
#[derive(PartialEq, Debug, Clone)]
pub struct Label {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// One stage of the funnel.
///
/// Coordinates are in chart units, y grows upwards: the first stage sits at y = 0 and
/// the next ones go down.
#[derive(PartialEq, Debug, Clone)]
pub struct FunnelSegment {
    pub stage: String,
    pub count: f64,
    pub top_width: f64,
    pub bottom_width: f64,
    /// Left end of the top edge.
    pub top_left: f64,
    /// Left end of the bottom edge.
    pub bottom_left: f64,
    pub y_top: f64,
    pub y_bottom: f64,
    pub fill: Rgb,
    pub edge: Rgb,
    pub count_label: Label,
    /// Conversion from the previous stage. Never present on the first stage.
    pub conversion_label: Option<Label>,
}

impl FunnelSegment {
    /// The four corners, clockwise from the top left.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.top_left, self.y_top),
            (self.top_left + self.top_width, self.y_top),
            (self.bottom_left + self.bottom_width, self.y_bottom),
            (self.bottom_left, self.y_bottom),
        ]
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct FunnelChart {
    pub title: String,
    pub segments: Vec<FunnelSegment>,
    pub layout: ChartLayout,
}

impl FunnelChart {
    /// The vertical extent of the chart: (lowest y, highest y).
    pub fn y_range(&self) -> (f64, f64) {
        let n = self.segments.len() as f64;
        let step = self.layout.height + self.layout.spacing;
        (-n * step, self.layout.spacing)
    }
}

/// Width of a stage edge before scaling by the counts.
///
/// The widths go linearly from `max_width` (top of the first stage) to `min_width`
/// (bottom of the last stage), whatever the data.
pub fn taper_widths(idx: usize, num_stages: usize, layout: &ChartLayout) -> (f64, f64) {
    let step = (layout.max_width - layout.min_width) / (num_stages.max(2) - 1) as f64;
    let top = layout.max_width - idx as f64 * step;
    let bottom = if idx + 1 < num_stages {
        layout.max_width - (idx + 1) as f64 * step
    } else {
        layout.min_width
    };
    (top, bottom)
}

/// Lays out a funnel chart for the given stages.
///
/// Arguments:
/// * `title` the title of the chart, usually the program name
/// * `stages` the (stage name, count) pairs, widest stage first
/// * `layout` the dimensions of the chart
///
/// The width of each trapezoid is the taper width (see [taper_widths]) multiplied by the
/// ratio between the count of the stage and the largest count. When all the counts are
/// zero, all the widths are zero.
pub fn layout_funnel(
    title: &str,
    stages: &[(String, f64)],
    layout: &ChartLayout,
) -> Result<FunnelChart, FunnelErrors> {
    if stages.is_empty() {
        return Err(FunnelErrors::EmptySeries {
            title: title.to_string(),
        });
    }
    layout.validate()?;

    let n = stages.len();
    let max_count = stages
        .iter()
        .map(|(_, c)| *c)
        .fold(f64::NEG_INFINITY, f64::max);
    let center = layout.total_width / 2.0;

    let mut segments: Vec<FunnelSegment> = Vec::with_capacity(n);
    for (idx, (stage, count)) in stages.iter().enumerate() {
        let (taper_top, taper_bottom) = taper_widths(idx, n, layout);
        let ratio = if max_count > 0.0 {
            count / max_count
        } else {
            0.0
        };
        let top_width = taper_top * ratio;
        let bottom_width = taper_bottom * ratio;
        let y_top = -(idx as f64) * (layout.height + layout.spacing);
        let y_bottom = y_top - layout.height;

        let count_label = Label {
            text: format!("{}: {}", stage, format_count(*count)),
            x: center,
            y: y_top - layout.height / 2.0,
        };
        let conversion_label = if idx > 0 {
            conversion_rate(stages[idx - 1].1, *count).map(|rate| Label {
                text: format!("{:.1}%", rate),
                x: center,
                y: y_top + layout.spacing / 2.0,
            })
        } else {
            None
        };

        let segment = FunnelSegment {
            stage: stage.clone(),
            count: *count,
            top_width,
            bottom_width,
            top_left: (layout.total_width - top_width) / 2.0,
            bottom_left: (layout.total_width - bottom_width) / 2.0,
            y_top,
            y_bottom,
            fill: stage_color(idx, n),
            edge: Rgb::BLACK,
            count_label,
            conversion_label,
        };
        debug!("layout_funnel: {}: {:?}", title, segment);
        segments.push(segment);
    }

    Ok(FunnelChart {
        title: title.to_string(),
        segments,
        layout: *layout,
    })
}
