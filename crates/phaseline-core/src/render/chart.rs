//! Drawing a [`ChartScene`] with `plotters`.
//!
//! Subplots are stacked top to bottom and share one date axis; only the
//! bottom subplot carries tick labels. Rows are laid out with the first
//! category at the bottom of each subplot. Marks are drawn in scene order,
//! which is already sorted by layer.

use std::borrow::Cow;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use chrono::NaiveDate;
use plotters::coord::Shift;
use plotters::coord::types::RangedDate;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle};
use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingErrorKind,
};
use tracing::{debug, warn};

use super::axis::format_tick;
use super::palette::Rgb;
use super::{ChartScene, Mark, RenderError, Subplot, XRange, fonts};

/// The dark chart theme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub background: Rgb,
    pub foreground: Rgb,
    pub today_line: Rgb,
    /// Font sizes in points.
    pub font_pt: f64,
    pub title_pt: f64,
    /// Bar thickness as a fraction of the row height.
    pub bar_height: f64,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Rgb(0x2e, 0x2e, 0x2e),
            foreground: Rgb::WHITE,
            today_line: Rgb(0xff, 0xa5, 0x00),
            font_pt: 10.0,
            title_pt: 12.0,
            bar_height: 0.5,
        }
    }
}

/// Render `scene` as an SVG document.
pub fn render_svg(scene: &ChartScene, theme: &Theme) -> Result<String, RenderError> {
    let mut out = String::new();
    draw(
        SVGBackend::with_string(&mut out, scene.figure.size_px()),
        scene,
        theme,
    )?;
    Ok(out)
}

/// Render `scene` as a PNG image at `path`. The path must end in `.png`.
pub fn render_png(scene: &ChartScene, theme: &Theme, path: &Path) -> Result<(), RenderError> {
    draw(
        BitMapBackend::new(path, scene.figure.size_px()),
        scene,
        theme,
    )
}

fn draw<DB>(backend: DB, scene: &ChartScene, theme: &Theme) -> Result<(), RenderError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    fonts::ensure_registered();
    let root = LenientText::new(backend).into_drawing_area();
    draw_scene(&root, scene, theme)
        .and_then(|()| root.present())
        .map_err(|e| RenderError::Draw(e.to_string()))
}

type DrawResult<T, DB> = Result<T, DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

/// Pixel sizes and text styles shared by every subplot.
struct Styles {
    background: RGBColor,
    foreground: RGBColor,
    today_line: RGBColor,
    margin: u32,
    pad: i32,
    row_label_area: u32,
    tick_label_area: u32,
    footer: u32,
    line_width: u32,
    marker_radius: u32,
    bar_half: f64,
    title: TextStyle<'static>,
    row_label: TextStyle<'static>,
    tick_label: TextStyle<'static>,
    gate_label: TextStyle<'static>,
    axis_title: TextStyle<'static>,
}

impl Styles {
    fn new(scene: &ChartScene, theme: &Theme) -> Self {
        let figure = scene.figure;
        let font_px = figure.points(theme.font_pt);
        let title_px = figure.points(theme.title_pt);
        let foreground = rgb(theme.foreground);
        let text = |px: f64, pos: Pos| {
            FontDesc::new(FontFamily::SansSerif, px, FontStyle::Normal)
                .color(&foreground)
                .pos(pos)
        };

        let longest_label = scene
            .categories
            .iter()
            .map(|c| c.chars().count())
            .max()
            .unwrap_or(0) as f64;
        let width = f64::from(figure.width_px());
        let row_label_area = (longest_label * font_px * 0.6 + font_px).max(width * 0.06);

        Self {
            background: rgb(theme.background),
            foreground,
            today_line: rgb(theme.today_line),
            margin: (f64::from(figure.height_px()) * 0.01).round() as u32,
            pad: (font_px * 0.5).round() as i32,
            row_label_area: row_label_area.round() as u32,
            tick_label_area: (font_px * 2.0).round() as u32,
            footer: (font_px * 2.5).round() as u32,
            line_width: figure.points(1.5).round().max(1.0) as u32,
            marker_radius: figure.points(1.75).round().max(1.0) as u32,
            bar_half: theme.bar_height / 2.0,
            title: text(title_px, Pos::new(HPos::Center, VPos::Top)),
            row_label: text(font_px, Pos::new(HPos::Right, VPos::Center)),
            tick_label: text(font_px, Pos::new(HPos::Center, VPos::Top)),
            gate_label: text(font_px, Pos::new(HPos::Left, VPos::Center)),
            axis_title: text(font_px, Pos::new(HPos::Center, VPos::Center)),
        }
    }
}

fn draw_scene<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    scene: &ChartScene,
    theme: &Theme,
) -> DrawResult<(), DB> {
    let styles = Styles::new(scene, theme);
    root.fill(&styles.background)?;
    let Some(last) = scene.subplots.len().checked_sub(1) else {
        debug!("empty scene, drawing background only");
        return Ok(());
    };

    let (_, height) = root.dim_in_pixel();
    let (body, footer) = root.split_vertically(height.saturating_sub(styles.footer));
    let panels = body.split_evenly((scene.subplots.len(), 1));

    let mut plot_x = 0..0;
    for (i, (subplot, panel)) in scene.subplots.iter().zip(&panels).enumerate() {
        plot_x = draw_subplot(root, panel, scene, subplot, &styles, i == last)?;
    }

    let (_, footer_h) = footer.dim_in_pixel();
    let (footer_x, _) = footer.get_base_pixel();
    let center = (plot_x.start + plot_x.end) / 2 - footer_x;
    footer.draw(&Text::new(
        "Timeline",
        (center, (footer_h / 2) as i32),
        styles.axis_title.clone(),
    ))?;
    Ok(())
}

/// Draw one project's panel. Returns the horizontal pixel span of its
/// plotting area.
fn draw_subplot<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    panel: &DrawingArea<DB, Shift>,
    scene: &ChartScene,
    subplot: &Subplot,
    styles: &Styles,
    bottom: bool,
) -> DrawResult<Range<i32>, DB> {
    let x = scene.x_range;
    let rows = scene.categories.len().max(1) as f64;
    let (y_lo, y_hi) = (-0.5, rows - 0.5);

    let mut builder = ChartBuilder::on(panel);
    builder
        .margin(styles.margin)
        .caption(printable(&subplot.project), styles.title.clone())
        .set_label_area_size(LabelAreaPosition::Left, styles.row_label_area);
    if bottom {
        builder.set_label_area_size(LabelAreaPosition::Bottom, styles.tick_label_area);
    }
    let mut chart = builder.build_cartesian_2d(RangedDate::from(x.start..x.end), y_lo..y_hi)?;

    chart.draw_series(std::iter::once(Rectangle::new(
        [(x.start, y_lo), (x.end, y_hi)],
        Color::stroke_width(&styles.foreground, 1),
    )))?;

    let bar = |row: usize, start: NaiveDate, end: NaiveDate| {
        let y = row as f64;
        [(start, y - styles.bar_half), (end, y + styles.bar_half)]
    };

    for mark in &subplot.marks {
        match mark {
            Mark::Spacer { row, start, end } => {
                if let Some((start, end)) = clip(&x, *start, *end) {
                    chart.draw_series(std::iter::once(Rectangle::new(
                        bar(*row, start, end),
                        TRANSPARENT.filled(),
                    )))?;
                }
            }
            Mark::TodayLine { at } => {
                chart.draw_series(DashedLineSeries::new(
                    [(*at, y_lo), (*at, y_hi)],
                    8,
                    5,
                    Color::stroke_width(&styles.today_line, styles.line_width),
                ))?;
            }
            Mark::GridLine { at } => {
                chart.draw_series(DashedLineSeries::new(
                    [(*at, y_lo), (*at, y_hi)],
                    4,
                    4,
                    Color::stroke_width(&styles.foreground, 1),
                ))?;
            }
            Mark::Bar {
                row,
                start,
                end,
                fill,
            } => {
                if let Some((start, end)) = clip(&x, *start, *end) {
                    let corners = bar(*row, start, end);
                    chart.draw_series([
                        Rectangle::new(corners, rgb(*fill).filled()),
                        Rectangle::new(corners, Color::stroke_width(&styles.foreground, 1)),
                    ])?;
                }
            }
            Mark::GateLabel { row, at, text } => {
                chart.draw_series(std::iter::once(Text::new(
                    printable(text).into_owned(),
                    (*at, *row as f64),
                    styles.gate_label.clone(),
                )))?;
            }
            Mark::GateMarker { row, at } => {
                chart.draw_series(std::iter::once(Circle::new(
                    (*at, *row as f64),
                    styles.marker_radius,
                    styles.foreground.filled(),
                )))?;
            }
        }
    }

    for (row, category) in scene.categories.iter().enumerate() {
        let (px, py) = chart.backend_coord(&(x.start, row as f64));
        root.draw(&Text::new(
            printable(category).into_owned(),
            (px - styles.pad, py),
            styles.row_label.clone(),
        ))?;
    }

    if bottom {
        for &tick in &scene.ticks {
            let (px, py) = chart.backend_coord(&(tick, y_lo));
            root.draw(&Text::new(
                format_tick(tick),
                (px, py + styles.pad),
                styles.tick_label.clone(),
            ))?;
        }
    }

    let (plot_x, _) = chart.plotting_area().get_pixel_range();
    Ok(plot_x)
}

fn rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

/// Restrict `start..end` to the visible window. `None` when nothing of the
/// interval is visible.
fn clip(x: &XRange, start: NaiveDate, end: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let start = start.max(x.start);
    let end = end.min(x.end);
    (start <= end).then_some((start, end))
}

/// Drop control characters, which no output format can carry.
fn printable(text: &str) -> Cow<'_, str> {
    if text.chars().any(char::is_control) {
        Cow::Owned(text.chars().filter(|c| !c.is_control()).collect())
    } else {
        Cow::Borrowed(text)
    }
}

/// Rough text extent used when no font is available for measuring.
fn approximate_text_size(text: &str, size: f64) -> (u32, u32) {
    let width = text.chars().count() as f64 * size * 0.6;
    (width.ceil() as u32, size.ceil() as u32)
}

/// Backend wrapper that omits text it cannot shape instead of failing the
/// whole render. Everything else is passed through untouched.
struct LenientText<DB> {
    inner: DB,
    skipped: usize,
}

impl<DB> LenientText<DB> {
    fn new(inner: DB) -> Self {
        Self { inner, skipped: 0 }
    }
}

impl<DB: DrawingBackend> DrawingBackend for LenientText<DB> {
    type ErrorType = DB::ErrorType;

    fn get_size(&self) -> (u32, u32) {
        self.inner.get_size()
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.ensure_prepared()
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        if self.skipped > 0 {
            warn!(skipped = self.skipped, "no usable font, chart text omitted");
            self.skipped = 0;
        }
        self.inner.present()
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_pixel(point, color)
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_line(from, to, style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_rect(upper_left, bottom_right, style, fill)
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_path(path, style)
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_circle(center, radius, style, fill)
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        vert: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.fill_polygon(vert, style)
    }

    fn blit_bitmap(
        &mut self,
        pos: BackendCoord,
        (iw, ih): (u32, u32),
        src: &[u8],
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.blit_bitmap(pos, (iw, ih), src)
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        let inner = &mut self.inner;
        match panic::catch_unwind(AssertUnwindSafe(|| inner.draw_text(text, style, pos))) {
            Ok(Err(DrawingErrorKind::FontError(_))) | Err(_) => {
                self.skipped += 1;
                Ok(())
            }
            Ok(result) => result,
        }
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        match panic::catch_unwind(AssertUnwindSafe(|| {
            self.inner.estimate_text_size(text, style)
        })) {
            Ok(Err(DrawingErrorKind::FontError(_))) | Err(_) => {
                Ok(approximate_text_size(text, style.size()))
            }
            Ok(result) => result,
        }
    }
}
