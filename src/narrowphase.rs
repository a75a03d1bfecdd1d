//! Narrowphase collision detection: SAT with reference face clipping.
//!
//! The entry point dispatches on the shape variant pair. For polygons the
//! pipeline is: axis search over both polygons' edge normals (with a
//! separating-axis early exit), reference/incident face selection,
//! clipping the incident face against the reference side planes, and
//! keeping the clipped points that lie behind the reference face as
//! contacts.

use glam::Vec2;

use crate::contact::{Face, Manifold};
use crate::shape::{Polygon, Shape};

/// Run narrowphase detection for a shape pair, filling the manifold's
/// contacts, normal and penetration. A contact count of zero means no
/// collision.
pub fn solve(manifold: &mut Manifold, a: &Shape, b: &Shape) {
    match (a, b) {
        (Shape::Polygon(a), Shape::Polygon(b)) => polygon_polygon(manifold, a, b),
    }
}

fn polygon_polygon(m: &mut Manifold, a: &Polygon, b: &Polygon) {
    m.contact_count = 0;

    let (penetration_a, face_a) = a.find_penetration(b);
    if penetration_a >= 0.0 {
        return;
    }
    let (penetration_b, face_b) = b.find_penetration(a);
    if penetration_b >= 0.0 {
        return;
    }

    // Pick the polygon of least penetration as the reference, with a
    // biased comparison so near-ties resolve consistently from frame to
    // frame. `flip` records that B won, since the output normal must
    // point A to B.
    let (reference, incident, reference_index, flip) =
        if bias_greater_than(penetration_a, penetration_b) {
            (a, b, face_a, false)
        } else {
            (b, a, face_b, true)
        };

    let mut incident_face = find_incident_face(reference, incident, reference_index);

    let (v1, v2) = reference.edge(reference_index);

    // Side planes of the reference edge, normal to the edge tangent.
    let side_normal = (v2 - v1).normalize();
    let reference_normal = side_normal.perp();
    // ax + by = c, with c the offset of the reference face from origin.
    let reference_c = reference_normal.dot(v1);
    let negative_side = -side_normal.dot(v1);
    let positive_side = side_normal.dot(v2);

    // Floating point error can leave fewer than the two required points.
    if clip(-side_normal, negative_side, &mut incident_face) < 2 {
        return;
    }
    if clip(side_normal, positive_side, &mut incident_face) < 2 {
        return;
    }

    m.normal = if flip {
        -reference_normal
    } else {
        reference_normal
    };

    // Keep clipped points behind the reference face.
    let mut count = 0;
    let separation = reference_normal.dot(incident_face.start) - reference_c;
    if separation <= 0.0 {
        m.contacts[count] = incident_face.start;
        m.penetration = -separation;
        count += 1;
    } else {
        m.penetration = 0.0;
    }

    let separation = reference_normal.dot(incident_face.end) - reference_c;
    if separation <= 0.0 {
        m.contacts[count] = incident_face.end;
        m.penetration += -separation;
        count += 1;
        m.penetration /= count as f32;
    }

    m.incident = incident_face;
    m.contact_count = count;
}

/// The incident polygon's face whose world normal is most anti-parallel
/// to the reference normal.
fn find_incident_face(reference: &Polygon, incident: &Polygon, reference_index: usize) -> Face {
    let reference_normal = reference.normal(reference_index);

    let mut face_index = 0;
    let mut min_dot = f32::MAX;
    for i in 0..incident.vertex_count() {
        let dot = reference_normal.dot(incident.normal(i));
        if dot < min_dot {
            min_dot = dot;
            face_index = i;
        }
    }

    let (start, end) = incident.edge(face_index);
    Face { start, end }
}

/// Clip a face segment against the plane `n . p = c`, keeping the part on
/// the negative side. Returns how many points survived; when a point was
/// cut away, the crossing point replaces it.
fn clip(n: Vec2, c: f32, face: &mut Face) -> usize {
    let mut out = [face.start, face.end];
    let mut sp = 0;

    // Signed distance of each endpoint to the plane.
    let d1 = n.dot(face.start) - c;
    let d2 = n.dot(face.end) - c;

    if d1 <= 0.0 {
        out[sp] = face.start;
        sp += 1;
    }
    if d2 <= 0.0 {
        out[sp] = face.end;
        sp += 1;
    }

    // Endpoints on opposite sides: exactly one survived above, so the
    // intersection point lands in the free slot.
    if d1 * d2 < 0.0 {
        let alpha = d1 / (d1 - d2);
        out[sp] = face.start + alpha * (face.end - face.start);
        sp += 1;
    }

    face.start = out[0];
    face.end = out[1];
    debug_assert!(sp <= 2);

    sp
}

/// Biased `a >= b` used for the reference-face choice, so near-equal
/// penetrations always resolve the same way.
fn bias_greater_than(a: f32, b: f32) -> bool {
    const BIAS_RELATIVE: f32 = 0.95;
    const BIAS_ABSOLUTE: f32 = 0.01;
    a >= b * BIAS_RELATIVE + a * BIAS_ABSOLUTE
}
