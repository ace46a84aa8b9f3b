//! Paints an [`ExportLayout`] onto a canvas and downloads it as a PNG.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, HtmlAnchorElement, HtmlCanvasElement};

use unblot::export::{Align, ExportLayout, ExportSnapshot, Rect, SCALE};

const CARD_RADIUS: f64 = 16.0;

pub fn download(document: &Document, snapshot: &ExportSnapshot) -> Result<(), JsValue> {
    let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
        .dyn_into()?;

    let layout = ExportLayout::compute(snapshot, |font, text| {
        ctx.set_font(font);
        ctx.measure_text(text).map(|metrics| metrics.width()).unwrap_or(0.0)
    });
    paint(&canvas, &ctx, &layout)?;

    let url = canvas.to_data_url_with_type("image/png")?;
    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url);
    anchor.set_download(&snapshot.file_name);
    anchor.click();
    Ok(())
}

fn paint(canvas: &HtmlCanvasElement, ctx: &CanvasRenderingContext2d, layout: &ExportLayout) -> Result<(), JsValue> {
    canvas.set_width((layout.width * SCALE).ceil() as u32);
    canvas.set_height((layout.height * SCALE).ceil() as u32);
    ctx.scale(SCALE, SCALE)?;

    // 135 degrees: top left to bottom right
    let gradient = ctx.create_linear_gradient(0.0, 0.0, layout.width, layout.height);
    for (offset, color) in [0.0, 0.5, 1.0].into_iter().zip(layout.colors.gradient) {
        gradient.add_color_stop(offset, color)?;
    }
    ctx.set_fill_style(&gradient);
    ctx.fill_rect(0.0, 0.0, layout.width, layout.height);

    ctx.set_fill_style(&JsValue::from_str(layout.colors.content_bg));
    rounded_rect(ctx, layout.card, CARD_RADIUS)?;
    ctx.fill();

    ctx.set_text_baseline("alphabetic");
    for run in &layout.runs {
        ctx.set_font(run.font);
        ctx.set_fill_style(&JsValue::from_str(run.color));
        ctx.set_text_align(match run.align {
            Align::Left => "left",
            Align::Right => "right",
        });
        ctx.fill_text(&run.text, run.x, run.y)?;
    }
    Ok(())
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, rect: Rect, radius: f64) -> Result<(), JsValue> {
    let Rect {
        x,
        y,
        width,
        height,
    } = rect;
    ctx.begin_path();
    ctx.move_to(x + radius, y);
    ctx.arc_to(x + width, y, x + width, y + height, radius)?;
    ctx.arc_to(x + width, y + height, x, y + height, radius)?;
    ctx.arc_to(x, y + height, x, y, radius)?;
    ctx.arc_to(x, y, x + width, y, radius)?;
    ctx.close_path();
    Ok(())
}
