//! Pollutant concentration bar chart, rendered to SVG markup.
//!
//! The SVG is embedded inline in the result page, so rendering goes through
//! an in-memory string backend rather than a file.

use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;

const CHART_SIZE: (u32, u32) = (800, 450);
const BAR_COLOR: RGBColor = RGBColor(135, 206, 235);
const GRID_COLOR: RGBColor = RGBColor(219, 219, 219);

/// Render one vertical bar per pollutant, in the order received.
///
/// Axis labels are the pollutant codes uppercased. An empty component set is
/// not an error: the axes render with no bars.
pub fn render_components_chart(components: &[(String, f64)]) -> anyhow::Result<String> {
    let labels: Vec<String> = components
        .iter()
        .map(|(code, _)| code.to_uppercase())
        .collect();
    let values: Vec<f64> = components.iter().map(|(_, value)| *value).collect();

    let mut svg = String::new();
    draw(&mut svg, &labels, &values)
        .map_err(|error| anyhow::anyhow!("Failed to render pollutant chart: {error}"))?;
    Ok(svg)
}

fn draw(
    svg: &mut String,
    labels: &[String],
    values: &[f64],
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let root = SVGBackend::with_string(svg, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let y_top = values.iter().copied().fold(0.0_f64, f64::max);
    let y_top = if y_top > 0.0 { y_top * 1.1 } else { 1.0 };
    let segments = labels.len().max(1) as u32;

    let mut chart = ChartBuilder::on(&root)
        .caption("Air Pollutant Concentrations (µg/m³)", ("sans-serif", 22))
        .margin(20)
        .x_label_area_size(28)
        .y_label_area_size(56)
        .build_cartesian_2d((0u32..segments).into_segmented(), 0f64..y_top)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .light_line_style(GRID_COLOR)
        .y_desc("Concentration (µg/m³)")
        .axis_desc_style(("sans-serif", 15))
        .x_label_formatter(&|segment| match segment {
            SegmentValue::CenterOf(index) => {
                labels.get(*index as usize).cloned().unwrap_or_default()
            }
            _ => String::new(),
        })
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BAR_COLOR.filled())
            .margin(10)
            .data(
                values
                    .iter()
                    .enumerate()
                    .map(|(index, value)| (index as u32, *value)),
            ),
    )?;

    root.present()?;
    Ok(())
}
