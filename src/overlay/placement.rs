use serde::Serialize;

use super::Position;
use super::bounds::ContentBounds;
use super::fit::MARGIN_RATIO;

/// Centre/middle-aligned draw point for the text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

/// Picks the text anchor for `position`, steering bottom and center placement
/// away from the detected content. Top placement is never checked: generated
/// icons are rarely pinned to the top edge.
///
/// `custom` is honoured only for [`Position::Custom`] and is not checked for
/// collisions; without it a custom placement plans like `Bottom`.
pub fn plan_position(
    bounds: &ContentBounds,
    position: Position,
    custom: Option<Anchor>,
    font_size: f32,
    canvas_width: u32,
    canvas_height: u32,
) -> Anchor {
    let width = canvas_width as f32;
    let height = canvas_height as f32;
    let center_x = width / 2.0;
    let margin = height * MARGIN_RATIO;
    let under_content = Anchor {
        x: center_x,
        y: height - margin - font_size * 0.4,
    };

    if let (Position::Custom, Some(anchor)) = (position, custom) {
        return anchor;
    }

    match position {
        Position::Top => Anchor {
            x: center_x,
            y: margin + font_size * 0.5,
        },
        Position::Center => {
            let content_half = bounds.height() as f32 / 2.0;
            let clearance = (height / 2.0 - bounds.center_y).abs();
            if clearance > content_half + font_size {
                Anchor {
                    x: center_x,
                    y: height / 2.0,
                }
            } else {
                under_content
            }
        }
        Position::Bottom | Position::Custom => {
            let space_below = height - bounds.bottom as f32;
            let space_above = bounds.top as f32;
            if space_below > font_size * 2.0 {
                under_content
            } else if space_above > font_size * 2.0 {
                Anchor {
                    x: center_x,
                    y: margin + font_size * 0.5,
                }
            } else {
                // Content covers nearly everything; hug the bottom edge.
                Anchor {
                    x: center_x,
                    y: height - font_size * 0.8,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(top: u32, bottom: u32, size: u32) -> ContentBounds {
        ContentBounds {
            top,
            bottom,
            left: 0,
            right: size,
            center_y: (top + bottom) as f32 / 2.0,
        }
    }

    #[test]
    fn icon_filling_canvas_hugs_bottom_edge() {
        let anchor = plan_position(
            &ContentBounds::full_canvas(1536, 1536),
            Position::Bottom,
            None,
            60.0,
            1536,
            1536,
        );
        assert_eq!(anchor, Anchor { x: 768.0, y: 1488.0 });
    }

    #[test]
    fn clear_space_below_icon_uses_bottom_margin() {
        let anchor = plan_position(&bounds(100, 900, 1536), Position::Bottom, None, 80.0, 1536, 1536);
        assert_eq!(anchor.x, 768.0);
        assert!((anchor.y - 1319.68).abs() < 0.01);
    }

    #[test]
    fn icon_in_lower_area_moves_text_above() {
        let anchor = plan_position(&bounds(400, 990, 1000), Position::Bottom, None, 50.0, 1000, 1000);
        assert!((anchor.y - 145.0).abs() < 0.001);
    }

    #[test]
    fn top_ignores_content() {
        let anchor = plan_position(
            &ContentBounds::full_canvas(800, 600),
            Position::Top,
            None,
            40.0,
            800,
            600,
        );
        assert_eq!(anchor.x, 400.0);
        assert!((anchor.y - 92.0).abs() < 0.001);
    }

    #[test]
    fn free_center_is_used() {
        let anchor = plan_position(&bounds(20, 200, 1000), Position::Center, None, 50.0, 1000, 1000);
        assert_eq!(anchor, Anchor { x: 500.0, y: 500.0 });
    }

    #[test]
    fn occupied_center_falls_back_to_bottom_margin_only() {
        // No room below either, but center never walks the full bottom chain.
        let anchor = plan_position(
            &ContentBounds::full_canvas(1000, 1000),
            Position::Center,
            None,
            50.0,
            1000,
            1000,
        );
        assert!((anchor.y - 860.0).abs() < 0.001);
    }

    #[test]
    fn custom_coordinates_are_verbatim() {
        let custom = Anchor { x: -5.0, y: 4000.0 };
        let anchor = plan_position(
            &ContentBounds::full_canvas(100, 100),
            Position::Custom,
            Some(custom),
            20.0,
            100,
            100,
        );
        assert_eq!(anchor, custom);
    }

    #[test]
    fn top_and_bottom_stay_on_canvas() {
        for size in [256u32, 512, 1024, 1536] {
            let font_size = size as f32 / 5.0;
            for (top, bottom) in [(size / 8, size / 2), (size / 3, size - 2), (1, size - 1)] {
                for position in [Position::Top, Position::Bottom] {
                    let anchor = plan_position(
                        &bounds(top, bottom, size),
                        position,
                        None,
                        font_size,
                        size,
                        size,
                    );
                    assert!(anchor.y > 0.0 && anchor.y < size as f32);
                }
            }
        }
    }
}
