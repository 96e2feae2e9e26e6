use log::debug;

use crate::color::{stage_color, Rgb};
use crate::config::FunnelErrors;
use crate::render::Label;
use crate::{conversion_rates, format_count};

/// One bar of the bar chart view.
///
/// The bar spans [x - width / 2, x + width / 2] horizontally, and [0, height] vertically.
/// Heights are relative: the largest count has a height of 1.
#[derive(PartialEq, Debug, Clone)]
pub struct Bar {
    pub stage: String,
    pub count: f64,
    pub x: f64,
    pub width: f64,
    pub height: f64,
    pub fill: Rgb,
    /// The count, then the retention from the previous stage.
    pub label: Label,
}

#[derive(PartialEq, Debug, Clone)]
pub struct BarChart {
    pub title: String,
    pub bars: Vec<Bar>,
    pub max_count: f64,
}

const BAR_WIDTH: f64 = 0.8;

/// Lays out the stages as bars, one unit apart.
///
/// The label of each bar holds the count, and for all the bars after the first one, the
/// retention from the previous stage when it is defined.
pub fn layout_bars(title: &str, stages: &[(String, f64)]) -> Result<BarChart, FunnelErrors> {
    if stages.is_empty() {
        return Err(FunnelErrors::EmptySeries {
            title: title.to_string(),
        });
    }
    let n = stages.len();
    let counts: Vec<f64> = stages.iter().map(|(_, c)| *c).collect();
    let max_count = counts.iter().cloned().fold(0.0, f64::max);
    let rates = conversion_rates(&counts);

    let bars: Vec<Bar> = stages
        .iter()
        .zip(rates)
        .enumerate()
        .map(|(idx, ((stage, count), rate))| {
            let height = if max_count > 0.0 {
                count / max_count
            } else {
                0.0
            };
            let text = match rate {
                Some(r) => format!("{}\n({:.1}%)", format_count(*count), r),
                None => format_count(*count),
            };
            Bar {
                stage: stage.clone(),
                count: *count,
                x: idx as f64,
                width: BAR_WIDTH,
                height,
                fill: stage_color(idx, n),
                label: Label {
                    text,
                    x: idx as f64,
                    y: height,
                },
            }
        })
        .collect();
    debug!("layout_bars: {}: {:?}", title, bars);

    Ok(BarChart {
        title: title.to_string(),
        bars,
        max_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_and_retention() {
        let stages = vec![
            ("A".to_string(), 2000.0),
            ("B".to_string(), 500.0),
            ("C".to_string(), 0.0),
            ("D".to_string(), 0.0),
        ];
        let chart = layout_bars("P", &stages).unwrap();
        assert_eq!(chart.max_count, 2000.0);
        assert_eq!(chart.bars[0].label.text, "2,000");
        assert_eq!(chart.bars[1].label.text, "500\n(25.0%)");
        assert_eq!(chart.bars[1].height, 0.25);
        assert_eq!(chart.bars[2].label.text, "0\n(0.0%)");
        assert_eq!(chart.bars[3].label.text, "0");
        assert_eq!(chart.bars[3].x, 3.0);
    }

    #[test]
    fn all_zero_and_empty() {
        let stages = vec![("A".to_string(), 0.0), ("B".to_string(), 0.0)];
        let chart = layout_bars("P", &stages).unwrap();
        assert!(chart.bars.iter().all(|b| b.height == 0.0));
        assert!(matches!(
            layout_bars("P", &[]),
            Err(FunnelErrors::EmptySeries { .. })
        ));
    }
}
