//! Lights, smoke puffs and lines.

use super::writer::{colour_text, LightColour, Obj7Writer};
use crate::config::ExportConfig;
use crate::error::Result;
use crate::report::{ExportLog, ObjectRef};
use crate::scene::{LampData, LampType, MeshData, SceneObject};
use crate::types::Vertex;

const SMOKE: [&str; 2] = ["smoke_black", "smoke_white"];

/// A mesh drawn as a line: one untextured quad whose two ends are each
/// narrower than `line_width` on every axis.
pub fn is_line(object: &SceneObject, mesh: &MeshData, line_width: f64) -> bool {
    line_ends(object, mesh, line_width).is_some()
}

/// Midpoints of the two narrow ends of a line mesh.
fn line_ends(object: &SceneObject, mesh: &MeshData, line_width: f64) -> Option<[Vertex; 2]> {
    if mesh.halo || mesh.faces.len() != 1 {
        return None;
    }
    let face = &mesh.faces[0];
    if face.indices.len() != 4 || (mesh.has_uv_layer && face.textured) {
        return None;
    }

    let v: Vec<Vertex> = face
        .indices
        .iter()
        .map(|&i| Vertex::from_local(mesh.vertices[i], &object.matrix))
        .collect();
    let i = (0..2).find(|&i| {
        v[i].equals(&v[i + 1], line_width) && v[i + 2].equals(&v[(i + 3) % 4], line_width)
    })?;
    Some([
        &(&v[i] + &v[i + 1]) / 2.0,
        &(&v[i + 2] + &v[(i + 3) % 4]) / 2.0,
    ])
}

pub fn write_line(
    writer: &mut Obj7Writer,
    object: &SceneObject,
    mesh: &MeshData,
    config: &ExportConfig,
) -> Result<()> {
    let Some([a, b]) = line_ends(object, mesh, config.line_width) else {
        return Ok(());
    };
    let colour = match mesh.materials.get(mesh.faces[0].material) {
        Some(rgb) => rgb.map(|c| colour_text(c * 10.0)),
        None => ["5", "5", "5"].map(String::from),
    };
    log::debug!("Exporting line \"{}\"", object.name);
    writer.line(&object.name, [&a, &b], &colour)
}

/// Write a point lamp as a light or smoke puff. Other lamp types are
/// reported and skipped.
pub fn write_lamp(
    writer: &mut Obj7Writer,
    object: &SceneObject,
    lamp: &LampData,
    config: &ExportConfig,
    log: &mut ExportLog,
) -> Result<()> {
    let name = object.name.as_str();
    if lamp.lamp_type != LampType::Point {
        log.info(
            format!("Ignoring Area, Spot, Sun or Hemi lamp \"{}\"", name),
            vec![ObjectRef::new(name)],
        );
        return Ok(());
    }

    let origin = Vertex::from_local([0.0; 3], &object.matrix);
    let short = name.split('.').next().unwrap_or(name);

    if SMOKE.contains(&name) {
        if config.is_csl() {
            log.info(format!("Ignoring \"{}\"", name), vec![ObjectRef::new(name)]);
            return Ok(());
        }
        log::debug!("Exporting \"{}\"", name);
        return writer.smoke(short, &origin, lamp.energy);
    }

    log::debug!("Exporting light \"{}\"", name);
    let colour = light_colour(short, lamp.color, config.is_csl());
    writer.light(name, &origin, colour)
}

/// Colour code for a light, from its name and colour.
///
/// Names of X-Plane's built-in aircraft lights, or names containing
/// "pulse", "strobe" and the like, map to fixed codes.
pub fn light_colour(short_name: &str, color: [f64; 3], csl: bool) -> LightColour {
    let words: Vec<String> = short_name
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let has = |word: &str| words.iter().any(|w| w == word);
    let scaled = color.map(|c| c * 10.0);

    if csl {
        if short_name == "airplane_nav_left" || short_name.starts_with("Nav Left") {
            LightColour::Special(11)
        } else if ["airplane_nav_right", "airplane_nav_righ"].contains(&short_name)
            || short_name.starts_with("Nav Right")
        {
            LightColour::Special(22)
        } else if ["airplane_landing", "airplane_taxi"].contains(&short_name)
            || ["Landing 1", "Landing 2", "Taxi"]
                .iter()
                .any(|p| short_name.starts_with(p))
        {
            LightColour::Special(55)
        } else if short_name == "airplane_beacon" || has("pulse") {
            LightColour::Special(33)
        } else if short_name == "airplane_strobe" || has("strobe") {
            LightColour::Special(44)
        } else {
            LightColour::Rgb(scaled)
        }
    } else if short_name == "airplane_beacon" || has("pulse") {
        LightColour::Special(99)
    } else if short_name == "airplane_strobe" || has("strobe") {
        LightColour::Special(98)
    } else if has("traffic") {
        LightColour::Special(97)
    } else if has("flash") {
        LightColour::Rgb(scaled.map(|c| -c))
    } else {
        LightColour::Rgb(scaled)
    }
}
