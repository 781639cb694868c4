//! Bounding box of the vector paths in a serialized SVG document.
//!
//! Every `path`, `rect`, `circle`, `ellipse`, `line`, `polygon` and
//! `polyline` element contributes, with the `transform` attributes of the
//! element and all of its ancestors applied. Text and images do not count.
//!
//! Quadratic segments contribute their exact extrema. Cubic segments
//! contribute their control points and elliptical arcs their end points, so
//! their boxes may be loose; the renderer emits neither.

use std::str::FromStr;

use log::trace;
use roxmltree::{Document, Node};
use svgtypes::{PathParser, PathSegment, PointsParser, TransformListParser, TransformListToken};
use tiny_skia::Transform;

use trustmap_core::{
    curve::QuadraticCurve,
    geometry::{Bounds, Point},
};

use super::Error;

/// Measures the union of all path boxes in `svg`, or `None` when the
/// document draws no paths.
///
/// # Errors
///
/// Fails when `svg` is not well-formed XML or holds an unparsable path or
/// transform.
pub fn path_bounds(svg: &str) -> Result<Option<Bounds>, Error> {
    let document = Document::parse(svg).map_err(|err| Error::Reparse(err.to_string()))?;
    let mut collector = Collector::default();
    collector.visit(document.root_element(), Transform::identity())?;
    trace!(paths = collector.paths; "Measured path bounds");
    Ok(collector.bounds)
}

#[derive(Default)]
struct Collector {
    bounds: Option<Bounds>,
    paths: usize,
}

impl Collector {
    fn visit(&mut self, node: Node<'_, '_>, parent: Transform) -> Result<(), Error> {
        let transform = match node.attribute("transform") {
            Some(list) => parent.pre_concat(parse_transform(list)?),
            None => parent,
        };

        let local = match node.tag_name().name() {
            "path" => path_points(node.attribute("d").unwrap_or_default())?,
            "rect" => {
                let (x, y) = (number(node, "x"), number(node, "y"));
                let (width, height) = (number(node, "width"), number(node, "height"));
                corners(x, y, x + width, y + height)
            }
            "circle" => {
                let (cx, cy, r) = (number(node, "cx"), number(node, "cy"), number(node, "r"));
                corners(cx - r, cy - r, cx + r, cy + r)
            }
            "ellipse" => {
                let (cx, cy) = (number(node, "cx"), number(node, "cy"));
                let (rx, ry) = (number(node, "rx"), number(node, "ry"));
                corners(cx - rx, cy - ry, cx + rx, cy + ry)
            }
            "line" => vec![
                (number(node, "x1"), number(node, "y1")),
                (number(node, "x2"), number(node, "y2")),
            ],
            "polygon" | "polyline" => {
                PointsParser::from(node.attribute("points").unwrap_or_default()).collect()
            }
            _ => Vec::new(),
        };

        if !local.is_empty() {
            self.paths += 1;
            self.include(&local, transform);
        }

        for child in node.children().filter(Node::is_element) {
            self.visit(child, transform)?;
        }
        Ok(())
    }

    fn include(&mut self, local: &[(f64, f64)], transform: Transform) {
        let mut points: Vec<tiny_skia::Point> = local
            .iter()
            .map(|&(x, y)| tiny_skia::Point::from_xy(x as f32, y as f32))
            .collect();
        transform.map_points(&mut points);

        for point in points {
            let point = Point::new(point.x, point.y);
            self.bounds = Some(match self.bounds {
                Some(bounds) => bounds.include_point(point),
                None => Bounds::from_point(point),
            });
        }
    }
}

fn number(node: Node<'_, '_>, name: &str) -> f64 {
    node.attribute(name)
        .and_then(|value| f64::from_str(value.trim()).ok())
        .unwrap_or(0.0)
}

fn corners(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<(f64, f64)> {
    vec![(min_x, min_y), (max_x, min_y), (max_x, max_y), (min_x, max_y)]
}

fn parse_transform(list: &str) -> Result<Transform, Error> {
    let mut transform = Transform::identity();
    for token in TransformListParser::from(list) {
        let token = token.map_err(|err| Error::Reparse(format!("transform `{list}`: {err}")))?;
        let step = match token {
            TransformListToken::Matrix { a, b, c, d, e, f } => Transform::from_row(
                a as f32, b as f32, c as f32, d as f32, e as f32, f as f32,
            ),
            TransformListToken::Translate { tx, ty } => Transform::from_translate(tx as f32, ty as f32),
            TransformListToken::Scale { sx, sy } => Transform::from_scale(sx as f32, sy as f32),
            TransformListToken::Rotate { angle } => Transform::from_rotate(angle as f32),
            TransformListToken::SkewX { angle } => {
                Transform::from_skew(angle.to_radians().tan() as f32, 0.0)
            }
            TransformListToken::SkewY { angle } => {
                Transform::from_skew(0.0, angle.to_radians().tan() as f32)
            }
        };
        transform = transform.pre_concat(step);
    }
    Ok(transform)
}

/// Points whose box equals the box of the path in its own coordinates.
fn path_points(data: &str) -> Result<Vec<(f64, f64)>, Error> {
    let mut points = Vec::new();
    let mut current = (0.0, 0.0);
    let mut subpath_start = (0.0, 0.0);
    let mut last_control: Option<(f64, f64)> = None;

    for segment in PathParser::from(data) {
        let segment = segment.map_err(|err| Error::Reparse(format!("path `{data}`: {err}")))?;
        let starts_subpath = matches!(segment, PathSegment::MoveTo { .. });
        let relative = |abs: bool, x: f64, y: f64| {
            if abs { (x, y) } else { (current.0 + x, current.1 + y) }
        };
        let mut quadratic_control = None;

        let end = match segment {
            PathSegment::MoveTo { abs, x, y } => {
                let end = relative(abs, x, y);
                subpath_start = end;
                end
            }
            PathSegment::LineTo { abs, x, y } => relative(abs, x, y),
            PathSegment::HorizontalLineTo { abs, x } => {
                (if abs { x } else { current.0 + x }, current.1)
            }
            PathSegment::VerticalLineTo { abs, y } => {
                (current.0, if abs { y } else { current.1 + y })
            }
            PathSegment::CurveTo { abs, x1, y1, x2, y2, x, y } => {
                points.push(relative(abs, x1, y1));
                points.push(relative(abs, x2, y2));
                relative(abs, x, y)
            }
            PathSegment::SmoothCurveTo { abs, x2, y2, x, y } => {
                points.push(relative(abs, x2, y2));
                relative(abs, x, y)
            }
            PathSegment::Quadratic { abs, x1, y1, x, y } => {
                let control = relative(abs, x1, y1);
                let end = relative(abs, x, y);
                quadratic_control = Some(control);
                points.extend(quadratic_extrema(current, control, end));
                end
            }
            PathSegment::SmoothQuadratic { abs, x, y } => {
                let control = match last_control {
                    Some((cx, cy)) => (2.0 * current.0 - cx, 2.0 * current.1 - cy),
                    None => current,
                };
                let end = relative(abs, x, y);
                quadratic_control = Some(control);
                points.extend(quadratic_extrema(current, control, end));
                end
            }
            PathSegment::EllipticalArc { abs, x, y, .. } => relative(abs, x, y),
            PathSegment::ClosePath { .. } => subpath_start,
        };

        if !starts_subpath {
            points.push(current);
        }
        points.push(end);
        current = end;
        last_control = quadratic_control;
    }
    Ok(points)
}

fn quadratic_extrema(
    start: (f64, f64),
    control: (f64, f64),
    end: (f64, f64),
) -> impl Iterator<Item = (f64, f64)> {
    let to_point = |(x, y): (f64, f64)| Point::new(x as f32, y as f32);
    let bounds = QuadraticCurve::new(to_point(start), to_point(control), to_point(end)).bounds();
    [
        (f64::from(bounds.min_x()), f64::from(bounds.min_y())),
        (f64::from(bounds.max_x()), f64::from(bounds.max_y())),
    ]
    .into_iter()
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn bounds_of(body: &str) -> Option<Bounds> {
        let svg = format!(r#"<svg xmlns="http://www.w3.org/2000/svg">{body}</svg>"#);
        path_bounds(&svg).expect("valid svg")
    }

    #[test]
    fn test_empty_document_has_no_bounds() {
        assert_eq!(bounds_of(""), None);
        assert_eq!(bounds_of("<text x=\"50\" y=\"50\">hi</text>"), None);
    }

    #[test]
    fn test_rect_and_ellipse() {
        let bounds = bounds_of(
            r#"<rect x="10" y="20" width="30" height="40"/><ellipse cx="100" cy="100" rx="10" ry="5"/>"#,
        )
        .unwrap();
        assert_eq!(bounds, Bounds::new(10.0, 20.0, 110.0, 105.0));
    }

    #[test]
    fn test_quadratic_path_uses_extrema() {
        // Peak of M 0 0 Q 100 200 200 0 is at y = 100.
        let bounds = bounds_of(r#"<path d="M 0 0 Q 100 200 200 0"/>"#).unwrap();
        assert_approx_eq!(f32, bounds.min_x(), 0.0);
        assert_approx_eq!(f32, bounds.max_x(), 200.0);
        assert_approx_eq!(f32, bounds.min_y(), 0.0);
        assert_approx_eq!(f32, bounds.max_y(), 100.0, epsilon = 0.001);
    }

    #[test]
    fn test_relative_path_segments() {
        let bounds = bounds_of(r#"<path d="m 10 10 l 20 0 v 30 h -40 z"/>"#).unwrap();
        assert_eq!(bounds, Bounds::new(-10.0, 10.0, 30.0, 40.0));
    }

    #[test]
    fn test_transforms_of_ancestors_apply() {
        let bounds = bounds_of(
            r#"<g transform="translate(100, 50)"><path d="M12 0 L-5 -8 L0 0 L-5 8 Z" transform="translate(10, 10)"/></g>"#,
        )
        .unwrap();
        assert_approx_eq!(f32, bounds.min_x(), 105.0);
        assert_approx_eq!(f32, bounds.max_x(), 122.0);
        assert_approx_eq!(f32, bounds.min_y(), 52.0);
        assert_approx_eq!(f32, bounds.max_y(), 68.0);
    }

    #[test]
    fn test_rotation_is_applied() {
        let bounds = bounds_of(r#"<line x1="0" y1="0" x2="10" y2="0" transform="rotate(90)"/>"#).unwrap();
        assert_approx_eq!(f32, bounds.min_x(), 0.0, epsilon = 0.0001);
        assert_approx_eq!(f32, bounds.max_x(), 0.0, epsilon = 0.0001);
        assert_approx_eq!(f32, bounds.max_y(), 10.0, epsilon = 0.0001);
    }

    #[test]
    fn test_polyline_points() {
        let bounds = bounds_of(r#"<polyline points="0,0 5,-5 10,3"/>"#).unwrap();
        assert_eq!(bounds, Bounds::new(0.0, -5.0, 10.0, 3.0));
    }

    #[test]
    fn test_malformed_svg_is_an_error() {
        assert!(path_bounds("<svg><rect></svg>").is_err());
    }
}
