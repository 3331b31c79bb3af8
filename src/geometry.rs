use crate::error::{PathError, TransformError};
use crate::types::{BBox, Point};

// 2D affine matrix in SVG order:
// | a c e |
// | b d f |
// | 0 0 1 |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translate(tx: f32, ty: f32) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::identity()
        }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::identity()
        }
    }

    pub fn rotate(deg: f32) -> Self {
        let rad = deg.to_radians();
        let s = libm::sinf(rad);
        let c = libm::cosf(rad);
        Self {
            a: c,
            b: s,
            c: -s,
            d: c,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn rotate_about(deg: f32, cx: f32, cy: f32) -> Self {
        Matrix::translate(cx, cy)
            .mul(Matrix::rotate(deg))
            .mul(Matrix::translate(-cx, -cy))
    }

    pub fn skew_x(deg: f32) -> Self {
        Self {
            c: libm::tanf(deg.to_radians()),
            ..Self::identity()
        }
    }

    pub fn skew_y(deg: f32) -> Self {
        Self {
            b: libm::tanf(deg.to_radians()),
            ..Self::identity()
        }
    }

    // [self] * [other]: `other` is applied to a point first.
    pub fn mul(self, other: Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn apply(self, p: Point) -> Point {
        Point {
            x: self.a * p.x + self.c * p.y + self.e,
            y: self.b * p.x + self.d * p.y + self.f,
        }
    }

    pub fn is_identity(self) -> bool {
        self == Self::identity()
    }

    // sqrt(|det|): uniform stand-in for stroke-width scaling.
    pub fn scale_factor(self) -> f32 {
        let det = self.a * self.d - self.b * self.c;
        libm::sqrtf(det.abs()).max(0.0)
    }
}

pub fn parse_transform_list(input: &str) -> Result<Matrix, TransformError> {
    let mut out = Matrix::identity();
    let mut s = input.trim();

    while !s.is_empty() {
        let Some(open) = s.find('(') else {
            return Err(TransformError::Malformed);
        };
        let name = s[..open].trim();
        let Some(close) = s[open + 1..].find(')') else {
            return Err(TransformError::Malformed);
        };
        let args_str = &s[open + 1..open + 1 + close];
        let args = parse_number_list(args_str)
            .ok_or_else(|| TransformError::InvalidArguments(name.to_string()))?;
        let bad_args = || TransformError::InvalidArguments(name.to_string());

        let m = match name {
            "translate" => match args.as_slice() {
                [tx] => Matrix::translate(*tx, 0.0),
                [tx, ty] => Matrix::translate(*tx, *ty),
                _ => return Err(bad_args()),
            },
            "scale" => match args.as_slice() {
                [s] => Matrix::scale(*s, *s),
                [sx, sy] => Matrix::scale(*sx, *sy),
                _ => return Err(bad_args()),
            },
            "rotate" => match args.as_slice() {
                [a] => Matrix::rotate(*a),
                [a, cx, cy] => Matrix::rotate_about(*a, *cx, *cy),
                _ => return Err(bad_args()),
            },
            "skewX" => match args.as_slice() {
                [a] => Matrix::skew_x(*a),
                _ => return Err(bad_args()),
            },
            "skewY" => match args.as_slice() {
                [a] => Matrix::skew_y(*a),
                _ => return Err(bad_args()),
            },
            "matrix" => match args.as_slice() {
                [a, b, c, d, e, f] => Matrix::new(*a, *b, *c, *d, *e, *f),
                _ => return Err(bad_args()),
            },
            "" => return Err(TransformError::Malformed),
            other => return Err(TransformError::UnknownFunction(other.to_string())),
        };

        out = out.mul(m);
        s = s[open + 1 + close + 1..]
            .trim_start_matches(|c: char| c.is_whitespace() || c == ',');
    }

    Ok(out)
}

// Whitespace/comma separated numbers; None if any token is not a number.
pub(crate) fn parse_number_list(input: &str) -> Option<Vec<f32>> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f32>().ok().filter(|v| v.is_finite()))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line(Point),
    Cubic { c1: Point, c2: Point, to: Point },
}

impl Segment {
    pub fn end(&self) -> Point {
        match *self {
            Segment::Line(p) => p,
            Segment::Cubic { to, .. } => to,
        }
    }

    fn map(self, f: impl Fn(Point) -> Point) -> Self {
        match self {
            Segment::Line(p) => Segment::Line(f(p)),
            Segment::Cubic { c1, c2, to } => Segment::Cubic {
                c1: f(c1),
                c2: f(c2),
                to: f(to),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subpath {
    pub start: Point,
    pub segments: Vec<Segment>,
    pub closed: bool,
}

impl Subpath {
    pub fn new(start: Point) -> Self {
        Self {
            start,
            segments: Vec::new(),
            closed: false,
        }
    }

    pub fn transformed(&self, m: Matrix) -> Subpath {
        Subpath {
            start: m.apply(self.start),
            segments: self.segments.iter().map(|s| s.map(|p| m.apply(p))).collect(),
            closed: self.closed,
        }
    }

    pub(crate) fn quantized(&self) -> Subpath {
        Subpath {
            start: self.start.quantized(),
            segments: self
                .segments
                .iter()
                .map(|s| s.map(Point::quantized))
                .collect(),
            closed: self.closed,
        }
    }
}

// Control-point bounding box; a superset of the exact curve bounds.
pub fn bbox_of_subpaths(subpaths: &[Subpath]) -> Option<BBox> {
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    let mut add = |p: Point| {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    };

    for sp in subpaths {
        add(sp.start);
        for seg in &sp.segments {
            match *seg {
                Segment::Line(p) => add(p),
                Segment::Cubic { c1, c2, to } => {
                    add(c1);
                    add(c2);
                    add(to);
                }
            }
        }
    }

    if !min_x.is_finite() || !min_y.is_finite() || !max_x.is_finite() || !max_y.is_finite() {
        return None;
    }
    Some(BBox {
        x: min_x,
        y: min_y,
        width: (max_x - min_x).max(0.0),
        height: (max_y - min_y).max(0.0),
    })
}

#[derive(Default)]
pub(crate) struct PathBuilder {
    done: Vec<Subpath>,
    current: Option<Subpath>,
    last_start: Point,
}

impl PathBuilder {
    pub(crate) fn move_to(&mut self, p: Point) {
        self.flush();
        self.current = Some(Subpath::new(p));
        self.last_start = p;
    }

    fn current(&mut self) -> &mut Subpath {
        let start = self.last_start;
        self.current.get_or_insert_with(|| Subpath::new(start))
    }

    pub(crate) fn line_to(&mut self, p: Point) {
        self.current().segments.push(Segment::Line(p));
    }

    pub(crate) fn cubic_to(&mut self, c1: Point, c2: Point, to: Point) {
        self.current().segments.push(Segment::Cubic { c1, c2, to });
    }

    pub(crate) fn close(&mut self) {
        if let Some(mut sp) = self.current.take() {
            sp.closed = true;
            if !sp.segments.is_empty() {
                self.done.push(sp);
            }
        }
    }

    fn flush(&mut self) {
        if let Some(sp) = self.current.take() {
            if !sp.segments.is_empty() {
                self.done.push(sp);
            }
        }
    }

    pub(crate) fn finish(mut self) -> Vec<Subpath> {
        self.flush();
        self.done
    }
}

pub fn parse_path_data(d: &str) -> Result<Vec<Subpath>, PathError> {
    let mut p = PathParser::new(d);
    let mut out = PathBuilder::default();
    let mut cur = Point::default();
    let mut start = Point::default();
    let mut last_cubic_ctrl2: Option<Point> = None;
    let mut last_quad_ctrl: Option<Point> = None;
    let mut first = true;

    loop {
        p.skip_separators();
        if p.at_end() {
            break;
        }
        let offset = p.i;
        let b = p.bytes[p.i];
        if !b.is_ascii_alphabetic() {
            return Err(if first {
                PathError::MissingMoveTo
            } else {
                PathError::InvalidNumber { offset }
            });
        }
        let cmd = b as char;
        p.i += 1;
        if first && !matches!(cmd, 'M' | 'm') {
            return Err(PathError::MissingMoveTo);
        }
        first = false;
        let rel = cmd.is_ascii_lowercase();
        let abs = |pt: Point, cur: Point| {
            if rel {
                Point::new(cur.x + pt.x, cur.y + pt.y)
            } else {
                pt
            }
        };

        match cmd.to_ascii_uppercase() {
            'M' => {
                let pt = abs(p.pair(cmd)?, cur);
                out.move_to(pt);
                cur = pt;
                start = pt;
                // Extra pairs after a moveto are implicit linetos.
                while p.more() {
                    let pt = abs(p.pair(cmd)?, cur);
                    out.line_to(pt);
                    cur = pt;
                }
                last_cubic_ctrl2 = None;
                last_quad_ctrl = None;
            }
            'L' => {
                loop {
                    let pt = abs(p.pair(cmd)?, cur);
                    out.line_to(pt);
                    cur = pt;
                    if !p.more() {
                        break;
                    }
                }
                last_cubic_ctrl2 = None;
                last_quad_ctrl = None;
            }
            'H' => {
                loop {
                    let x = p.number(cmd)?;
                    cur = Point::new(if rel { cur.x + x } else { x }, cur.y);
                    out.line_to(cur);
                    if !p.more() {
                        break;
                    }
                }
                last_cubic_ctrl2 = None;
                last_quad_ctrl = None;
            }
            'V' => {
                loop {
                    let y = p.number(cmd)?;
                    cur = Point::new(cur.x, if rel { cur.y + y } else { y });
                    out.line_to(cur);
                    if !p.more() {
                        break;
                    }
                }
                last_cubic_ctrl2 = None;
                last_quad_ctrl = None;
            }
            'C' => loop {
                let c1 = abs(p.pair(cmd)?, cur);
                let c2 = abs(p.pair(cmd)?, cur);
                let to = abs(p.pair(cmd)?, cur);
                out.cubic_to(c1, c2, to);
                cur = to;
                last_cubic_ctrl2 = Some(c2);
                last_quad_ctrl = None;
                if !p.more() {
                    break;
                }
            },
            'S' => loop {
                let c2 = abs(p.pair(cmd)?, cur);
                let to = abs(p.pair(cmd)?, cur);
                let c1 = match last_cubic_ctrl2 {
                    Some(prev) => Point::new(2.0 * cur.x - prev.x, 2.0 * cur.y - prev.y),
                    None => cur,
                };
                out.cubic_to(c1, c2, to);
                cur = to;
                last_cubic_ctrl2 = Some(c2);
                last_quad_ctrl = None;
                if !p.more() {
                    break;
                }
            },
            'Q' => loop {
                let ctrl = abs(p.pair(cmd)?, cur);
                let to = abs(p.pair(cmd)?, cur);
                let (c1, c2) = quad_to_cubic(cur, ctrl, to);
                out.cubic_to(c1, c2, to);
                cur = to;
                last_quad_ctrl = Some(ctrl);
                last_cubic_ctrl2 = None;
                if !p.more() {
                    break;
                }
            },
            'T' => loop {
                let to = abs(p.pair(cmd)?, cur);
                let ctrl = match last_quad_ctrl {
                    Some(prev) => Point::new(2.0 * cur.x - prev.x, 2.0 * cur.y - prev.y),
                    None => cur,
                };
                let (c1, c2) = quad_to_cubic(cur, ctrl, to);
                out.cubic_to(c1, c2, to);
                cur = to;
                last_quad_ctrl = Some(ctrl);
                last_cubic_ctrl2 = None;
                if !p.more() {
                    break;
                }
            },
            'A' => {
                loop {
                    let rx = p.number(cmd)?;
                    let ry = p.number(cmd)?;
                    let rot = p.number(cmd)?;
                    let large_arc = p.flag(cmd)?;
                    let sweep = p.flag(cmd)?;
                    let to = abs(p.pair(cmd)?, cur);
                    match arc_to_cubics(cur, rx, ry, rot, large_arc, sweep, to) {
                        Some(curves) => {
                            for (c1, c2, end) in curves {
                                out.cubic_to(c1, c2, end);
                            }
                        }
                        None => out.line_to(to),
                    }
                    cur = to;
                    if !p.more() {
                        break;
                    }
                }
                last_cubic_ctrl2 = None;
                last_quad_ctrl = None;
            }
            'Z' => {
                out.close();
                cur = start;
                last_cubic_ctrl2 = None;
                last_quad_ctrl = None;
            }
            _ => return Err(PathError::UnknownCommand { command: cmd, offset }),
        }
    }

    Ok(out.finish())
}

pub(crate) fn quad_to_cubic(p0: Point, ctrl: Point, p2: Point) -> (Point, Point) {
    let c1 = Point::new(
        p0.x + (2.0 / 3.0) * (ctrl.x - p0.x),
        p0.y + (2.0 / 3.0) * (ctrl.y - p0.y),
    );
    let c2 = Point::new(
        p2.x + (2.0 / 3.0) * (ctrl.x - p2.x),
        p2.y + (2.0 / 3.0) * (ctrl.y - p2.y),
    );
    (c1, c2)
}

// SVG 1.1 implementation notes, center parameterization, split into <= 90deg pieces.
// None means the arc degenerates to a straight line.
pub(crate) fn arc_to_cubics(
    from: Point,
    rx_in: f32,
    ry_in: f32,
    x_axis_rotation_deg: f32,
    large_arc: bool,
    sweep: bool,
    to: Point,
) -> Option<Vec<(Point, Point, Point)>> {
    use std::f32::consts::PI;

    let mut rx = rx_in.abs();
    let mut ry = ry_in.abs();
    if rx == 0.0 || ry == 0.0 || from == to {
        return None;
    }

    let phi = x_axis_rotation_deg.to_radians();
    let sin_phi = libm::sinf(phi);
    let cos_phi = libm::cosf(phi);

    let dx2 = (from.x - to.x) / 2.0;
    let dy2 = (from.y - to.y) / 2.0;
    let x1p = cos_phi * dx2 + sin_phi * dy2;
    let y1p = -sin_phi * dx2 + cos_phi * dy2;

    let x1p2 = x1p * x1p;
    let y1p2 = y1p * y1p;
    let lambda = (x1p2 / (rx * rx)) + (y1p2 / (ry * ry));
    if lambda > 1.0 {
        let s = libm::sqrtf(lambda);
        rx *= s;
        ry *= s;
    }

    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let num = rx2 * ry2 - rx2 * y1p2 - ry2 * x1p2;
    let den = rx2 * y1p2 + ry2 * x1p2;
    let mut coef = 0.0;
    if den != 0.0 {
        let sign = if large_arc == sweep { -1.0 } else { 1.0 };
        coef = sign * libm::sqrtf((num / den).max(0.0));
    }
    let cxp = coef * (rx * y1p / ry);
    let cyp = coef * (-ry * x1p / rx);

    let cx = cos_phi * cxp - sin_phi * cyp + (from.x + to.x) / 2.0;
    let cy = sin_phi * cxp + cos_phi * cyp + (from.y + to.y) / 2.0;

    fn angle(ux: f32, uy: f32, vx: f32, vy: f32) -> f32 {
        let dot = ux * vx + uy * vy;
        let det = ux * vy - uy * vx;
        libm::atan2f(det, dot)
    }

    let ux = (x1p - cxp) / rx;
    let uy = (y1p - cyp) / ry;
    let vx = (-x1p - cxp) / rx;
    let vy = (-y1p - cyp) / ry;

    let mut theta = angle(1.0, 0.0, ux, uy);
    let mut dtheta = angle(ux, uy, vx, vy);
    if !sweep && dtheta > 0.0 {
        dtheta -= 2.0 * PI;
    } else if sweep && dtheta < 0.0 {
        dtheta += 2.0 * PI;
    }

    let count = libm::ceilf(dtheta.abs() / (PI / 2.0) - 1e-3).max(1.0) as usize;
    let delta = dtheta / count as f32;
    let ellipse = EllipseFrame {
        cx,
        cy,
        rx,
        ry,
        sin_phi,
        cos_phi,
    };

    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let mut piece = ellipse.segment(theta, theta + delta);
        if i + 1 == count {
            // Land exactly on the requested endpoint.
            piece.2 = to;
        }
        out.push(piece);
        theta += delta;
    }
    Some(out)
}

struct EllipseFrame {
    cx: f32,
    cy: f32,
    rx: f32,
    ry: f32,
    sin_phi: f32,
    cos_phi: f32,
}

impl EllipseFrame {
    fn map(&self, x: f32, y: f32) -> Point {
        let x = self.rx * x;
        let y = self.ry * y;
        Point::new(
            self.cx + self.cos_phi * x - self.sin_phi * y,
            self.cy + self.sin_phi * x + self.cos_phi * y,
        )
    }

    fn segment(&self, t1: f32, t2: f32) -> (Point, Point, Point) {
        let k = (4.0 / 3.0) * libm::tanf((t2 - t1) / 4.0);
        let (s1, c1) = (libm::sinf(t1), libm::cosf(t1));
        let (s2, c2) = (libm::sinf(t2), libm::cosf(t2));
        (
            self.map(c1 - k * s1, s1 + k * c1),
            self.map(c2 + k * s2, s2 - k * c2),
            self.map(c2, s2),
        )
    }
}

struct PathParser<'a> {
    bytes: &'a [u8],
    i: usize,
}

impl<'a> PathParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            i: 0,
        }
    }

    fn skip_separators(&mut self) {
        while self.i < self.bytes.len() {
            match self.bytes[self.i] {
                b' ' | b'\n' | b'\r' | b'\t' | b',' => self.i += 1,
                _ => break,
            }
        }
    }

    fn at_end(&self) -> bool {
        self.i >= self.bytes.len()
    }

    // True when another argument set follows (implicit command repeat).
    fn more(&mut self) -> bool {
        self.skip_separators();
        !self.at_end() && matches!(self.bytes[self.i], b'0'..=b'9' | b'+' | b'-' | b'.')
    }

    fn number(&mut self, command: char) -> Result<f32, PathError> {
        self.skip_separators();
        let start = self.i;
        if self.at_end() || self.bytes[self.i].is_ascii_alphabetic() {
            return Err(PathError::MissingCoordinates {
                command,
                offset: start,
            });
        }
        let invalid = PathError::InvalidNumber { offset: start };

        if matches!(self.bytes[self.i], b'+' | b'-') {
            self.i += 1;
        }
        let mut digits = self.digits();
        if self.i < self.bytes.len() && self.bytes[self.i] == b'.' {
            self.i += 1;
            digits += self.digits();
        }
        if digits == 0 {
            return Err(invalid);
        }
        if self.i < self.bytes.len() && matches!(self.bytes[self.i], b'e' | b'E') {
            self.i += 1;
            if self.i < self.bytes.len() && matches!(self.bytes[self.i], b'+' | b'-') {
                self.i += 1;
            }
            if self.digits() == 0 {
                return Err(invalid);
            }
        }

        std::str::from_utf8(&self.bytes[start..self.i])
            .ok()
            .and_then(|s| s.parse::<f32>().ok())
            .filter(|v| v.is_finite())
            .ok_or(invalid)
    }

    fn digits(&mut self) -> usize {
        let start = self.i;
        while self.i < self.bytes.len() && self.bytes[self.i].is_ascii_digit() {
            self.i += 1;
        }
        self.i - start
    }

    // Arc flags are a single 0/1 and may be packed without separators ("01").
    fn flag(&mut self, command: char) -> Result<bool, PathError> {
        self.skip_separators();
        if self.at_end() {
            return Err(PathError::MissingCoordinates {
                command,
                offset: self.i,
            });
        }
        let offset = self.i;
        match self.bytes[self.i] {
            b'0' => {
                self.i += 1;
                Ok(false)
            }
            b'1' => {
                self.i += 1;
                Ok(true)
            }
            b if b.is_ascii_alphabetic() => {
                Err(PathError::MissingCoordinates { command, offset })
            }
            _ => Err(PathError::InvalidNumber { offset }),
        }
    }

    fn pair(&mut self, command: char) -> Result<Point, PathError> {
        let x = self.number(command)?;
        let y = self.number(command)?;
        Ok(Point::new(x, y))
    }
}
