//! SVG output for the charts.

use crate::color::Rgb;
use crate::render::FunnelChart;
use crate::render_bars::BarChart;

/// Pixel dimensions of the generated images.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct SvgStyle {
    /// Size of one chart unit, in pixels.
    pub px_per_unit: f64,
    /// Space reserved above the chart for the title.
    pub title_band: f64,
    pub title_font_size: f64,
    pub label_font_size: f64,
    /// Bar chart only: the width given to each bar slot.
    pub bar_slot: f64,
    /// Bar chart only: the height of the tallest bar.
    pub bar_area_height: f64,
}

impl SvgStyle {
    pub const DEFAULT_STYLE: SvgStyle = SvgStyle {
        px_per_unit: 60.0,
        title_band: 40.0,
        title_font_size: 16.0,
        label_font_size: 13.0,
        bar_slot: 90.0,
        bar_area_height: 300.0,
    };
}

impl Default for SvgStyle {
    fn default() -> Self {
        SvgStyle::DEFAULT_STYLE
    }
}

pub fn escape_xml(s: &str) -> String {
    let mut res = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => res.push_str("&amp;"),
            '<' => res.push_str("&lt;"),
            '>' => res.push_str("&gt;"),
            '"' => res.push_str("&quot;"),
            '\'' => res.push_str("&apos;"),
            _ => res.push(c),
        }
    }
    res
}

/// Draws a funnel chart.
///
/// The chart is mapped on a canvas of `total_width` units, the title sits above the first stage.
pub fn to_svg(chart: &FunnelChart, style: &SvgStyle) -> String {
    let ppu = style.px_per_unit;
    let (y_low, y_high) = chart.y_range();
    let width = chart.layout.total_width * ppu;
    let height = style.title_band + (y_high - y_low) * ppu;
    let px = |x: f64| x * ppu;
    let py = |y: f64| style.title_band + (y_high - y) * ppu;

    let mut body = String::new();
    for seg in chart.segments.iter() {
        let points: Vec<String> = seg
            .corners()
            .iter()
            .map(|(x, y)| format!("{:.2},{:.2}", px(*x), py(*y)))
            .collect();
        body.push_str(&format!(
            r##"  <polygon points="{}" fill="{}" stroke="{}" stroke-width="1"/>
"##,
            points.join(" "),
            seg.fill,
            seg.edge
        ));
        body.push_str(&format!(
            r##"  <text x="{:.2}" y="{:.2}" text-anchor="middle" dominant-baseline="middle" font-size="{}" font-weight="bold">{}</text>
"##,
            px(seg.count_label.x),
            py(seg.count_label.y),
            style.label_font_size,
            escape_xml(&seg.count_label.text)
        ));
        if let Some(conv) = &seg.conversion_label {
            body.push_str(&format!(
                r##"  <text x="{:.2}" y="{:.2}" text-anchor="middle" font-size="{}" fill="{}">{}</text>
"##,
                px(conv.x),
                py(conv.y),
                style.label_font_size - 1.0,
                Rgb::GRAY,
                escape_xml(&conv.text)
            ));
        }
    }

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="0 0 {:.2} {:.2}" style="background:white">
  <text x="{:.2}" y="{:.2}" text-anchor="middle" font-size="{}" font-weight="600">{}</text>
{}</svg>
"##,
        width,
        height,
        width,
        height,
        width / 2.0,
        style.title_band * 0.6,
        style.title_font_size,
        escape_xml(&chart.title),
        body
    )
}

/// Draws the bar chart view, with the stage names below the bars.
pub fn bars_to_svg(chart: &BarChart, style: &SvgStyle) -> String {
    let margin_left = 60.0;
    // The stage names are long and rotated.
    let margin_bottom = 200.0;
    // Room for the two lines of label above the tallest bar.
    let label_band = 2.5 * style.label_font_size;
    let top = style.title_band + label_band;
    let slot = style.bar_slot;
    let area = style.bar_area_height;
    let width = margin_left + slot * chart.bars.len() as f64 + 20.0;
    let height = top + area + margin_bottom;
    let baseline = top + area;

    let mut body = String::new();
    body.push_str(&format!(
        r##"  <line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="#000000" stroke-width="1"/>
"##,
        margin_left,
        baseline,
        width - 10.0,
        baseline
    ));
    for bar in chart.bars.iter() {
        let cx = margin_left + slot * (bar.x + 0.5);
        let w = bar.width * slot;
        let h = bar.height * area;
        body.push_str(&format!(
            r##"  <rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/>
"##,
            cx - w / 2.0,
            baseline - h,
            w,
            h,
            bar.fill
        ));
        let lines: Vec<&str> = bar.label.text.lines().collect();
        let first_y = baseline - h - 4.0 - (lines.len().max(1) - 1) as f64 * style.label_font_size;
        let tspans: Vec<String> = lines
            .iter()
            .enumerate()
            .map(|(idx, l)| {
                format!(
                    r##"<tspan x="{:.2}" y="{:.2}">{}</tspan>"##,
                    cx,
                    first_y + idx as f64 * style.label_font_size,
                    escape_xml(l)
                )
            })
            .collect();
        body.push_str(&format!(
            r##"  <text text-anchor="middle" font-size="{}">{}</text>
"##,
            style.label_font_size - 2.0,
            tspans.join("")
        ));
        body.push_str(&format!(
            r##"  <text x="{:.2}" y="{:.2}" text-anchor="end" font-size="{}" transform="rotate(-45, {:.2}, {:.2})">{}</text>
"##,
            cx,
            baseline + 14.0,
            style.label_font_size - 2.0,
            cx,
            baseline + 14.0,
            escape_xml(&bar.stage)
        ));
    }

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="0 0 {:.2} {:.2}" style="background:white">
  <text x="{:.2}" y="{:.2}" text-anchor="middle" font-size="{}" font-weight="600">Program: {}</text>
  <text x="15" y="{:.2}" text-anchor="middle" font-size="{}" transform="rotate(-90, 15, {:.2})">Leads</text>
{}</svg>
"##,
        width,
        height,
        width,
        height,
        width / 2.0,
        style.title_band * 0.6,
        style.title_font_size,
        escape_xml(&chart.title),
        top + area / 2.0,
        style.label_font_size,
        top + area / 2.0,
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartLayout;
    use crate::render::layout_funnel;
    use crate::render_bars::layout_bars;

    fn stages() -> Vec<(String, f64)> {
        vec![
            ("MQL_inclusive".to_string(), 1500.0),
            ("REGISTERED_inclusive".to_string(), 300.0),
        ]
    }

    #[test]
    fn funnel_svg() {
        let chart = layout_funnel("R&D <MSc>", &stages(), &ChartLayout::DEFAULT_LAYOUT).unwrap();
        let svg = to_svg(&chart, &SvgStyle::DEFAULT_STYLE);
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<polygon").count(), 2);
        assert!(svg.contains("R&amp;D &lt;MSc&gt;"));
        assert!(svg.contains("MQL_inclusive: 1,500"));
        assert!(svg.contains("20.0%"));
        // 10 units wide, 2 * 1.2 + 0.2 units high plus the title.
        assert!(svg.contains(r#"width="600" height="196""#));
        // First polygon: top edge from x=1 to x=9 at the top of the chart.
        assert!(svg.contains(r#"points="60.00,52.00 540.00,52.00"#));
    }

    #[test]
    fn bars_svg() {
        let chart = layout_bars("ProgA", &stages()).unwrap();
        let svg = bars_to_svg(&chart, &SvgStyle::DEFAULT_STYLE);
        assert_eq!(svg.matches("<rect").count(), 2);
        assert!(svg.contains("Program: ProgA"));
        assert!(svg.contains("(20.0%)"));
        assert!(svg.contains(">Leads</text>"));
    }
}
