//! Vector outputs: GeoJSON feature collections and KML documents.
//!
//! Every product is written in the input frame. Network geometry lives in
//! the working frame, so the writers map it back through the batch's
//! projection; GeoJSON collections are tagged with the input frame's CRS.
//! Lengths and areas are always working-frame measurements.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use geo::Coord;
use serde_json::{json, Value};

use crate::error::{Result, SurveyError};
use crate::perimeter::{BoundaryPolygon, ExclusionSet, ExtremePoint, StraightLine};
use crate::projection::{Projection, WorkingFrame, WGS84_EPSG};
use crate::{LineSegment, OrderedLine};

/// Rounding applied to lengths in attribute tables.
fn km3(length_km: f64) -> f64 {
    (length_km * 1000.0).round() / 1000.0
}

fn point_json(c: Coord<f64>) -> Value {
    json!([c.x, c.y])
}

/// Working-frame coordinates mapped back to the input frame.
fn coords_json<'a>(
    coords: impl IntoIterator<Item = &'a Coord<f64>>,
    projection: &dyn Projection,
) -> Value {
    Value::Array(
        coords
            .into_iter()
            .map(|c| point_json(projection.unproject(*c)))
            .collect(),
    )
}

fn feature(properties: Value, geometry: Value) -> Value {
    json!({ "type": "Feature", "properties": properties, "geometry": geometry })
}

/// Named CRS member for the input frame, `None` for an untagged linear frame.
pub fn crs_json(frame: &WorkingFrame) -> Option<Value> {
    let name = match frame.input.epsg()? {
        WGS84_EPSG => "urn:ogc:def:crs:OGC:1.3:CRS84".to_string(),
        code => format!("urn:ogc:def:crs:EPSG::{code}"),
    };
    Some(json!({ "type": "name", "properties": { "name": name } }))
}

fn collection(features: Vec<Value>, frame: &WorkingFrame) -> Value {
    let mut value = json!({ "type": "FeatureCollection", "features": features });
    if let (Some(crs), Some(object)) = (crs_json(frame), value.as_object_mut()) {
        object.insert("crs".to_string(), crs);
    }
    value
}

/// Per-flight segment layer (`ID`, `direction`, `long_km`).
///
/// Segments are in the input frame and written unchanged; `long_km` is
/// measured in the working frame.
pub fn segments_geojson(segments: &[LineSegment], frame: &WorkingFrame) -> Value {
    collection(
        segments
            .iter()
            .map(|s| {
                let coords: Vec<Value> = s.geometry.0.iter().map(|c| point_json(*c)).collect();
                feature(
                    json!({
                        "ID": s.sequence_id,
                        "flight": s.flight_id,
                        "direction": s.direction.as_str(),
                        "long_km": km3(frame.segment_length_km(s)),
                    }),
                    json!({ "type": "LineString", "coordinates": coords }),
                )
            })
            .collect(),
        frame,
    )
}

/// Ordered merged line layer.
pub fn lines_geojson(lines: &[OrderedLine], frame: &WorkingFrame) -> Value {
    collection(
        lines
            .iter()
            .map(|l| {
                let parts: Vec<Value> = l
                    .line
                    .geometry
                    .0
                    .iter()
                    .map(|ls| coords_json(&ls.0, frame))
                    .collect();
                feature(
                    json!({
                        "ID": l.id,
                        "direction": l.direction().as_str(),
                        "long_km": km3(l.length_km()),
                        "segments": l.line.segment_count,
                        "flights": l.line.source_flights,
                    }),
                    json!({ "type": "MultiLineString", "coordinates": parts }),
                )
            })
            .collect(),
        frame,
    )
}

/// Lines reduced to their extreme points.
pub fn straight_lines_geojson(lines: &[StraightLine], frame: &WorkingFrame) -> Value {
    collection(
        lines
            .iter()
            .map(|l| {
                feature(
                    json!({
                        "ID": l.id,
                        "direction": l.direction.as_str(),
                        "long_km": km3(l.length() / 1000.0),
                    }),
                    json!({
                        "type": "LineString",
                        "coordinates": coords_json([&l.line.start, &l.line.end], frame),
                    }),
                )
            })
            .collect(),
        frame,
    )
}

/// Extreme points layer (`ID`, `role`) without the excluded points.
pub fn extreme_points_geojson(
    points: &[ExtremePoint],
    exclude: &ExclusionSet,
    frame: &WorkingFrame,
) -> Value {
    collection(
        points
            .iter()
            .filter(|p| !exclude.contains(&p.key()))
            .map(|p| {
                feature(
                    json!({ "ID": p.line_id, "role": p.role.as_str() }),
                    json!({ "type": "Point", "coordinates": point_json(frame.unproject(p.coord)) }),
                )
            })
            .collect(),
        frame,
    )
}

/// Boundary polygon layer with its areas.
pub fn boundary_geojson(boundary: &BoundaryPolygon, frame: &WorkingFrame) -> Value {
    collection(
        vec![feature(
            json!({
                "area_km2": boundary.area_km2(),
                "area_ha": boundary.area_hectares(),
                "vertices": boundary.vertices.len(),
            }),
            json!({
                "type": "Polygon",
                "coordinates": [coords_json(&boundary.ring().0, frame)],
            }),
        )],
        frame,
    )
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| SurveyError::io(path, e))?;
    Ok(BufWriter::new(file))
}

/// Write a JSON value to `path`.
pub fn write_geojson(path: &Path, value: &Value) -> Result<()> {
    let mut writer = create(path)?;
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(|e| SurveyError::io(path, e))
}

/// Escape XML special characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn kml_coordinates<'a>(
    coords: impl IntoIterator<Item = &'a Coord<f64>>,
    projection: &dyn Projection,
) -> String {
    coords
        .into_iter()
        .map(|c| {
            let lonlat = projection.unproject(*c);
            format!("{:.8},{:.8}", lonlat.x, lonlat.y)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn kml_header<W: Write>(w: &mut W, name: &str) -> std::io::Result<()> {
    writeln!(w, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(w, r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#)?;
    writeln!(w, "  <Document>")?;
    writeln!(w, "    <name>{}</name>", escape_xml(name))
}

fn kml_footer<W: Write>(w: &mut W) -> std::io::Result<()> {
    writeln!(w, "  </Document>")?;
    writeln!(w, "</kml>")
}

/// KML document with one placemark per ordered line.
pub fn write_lines_kml<W: Write>(
    w: &mut W,
    lines: &[OrderedLine],
    projection: &dyn Projection,
) -> std::io::Result<()> {
    kml_header(w, "Lines")?;
    for line in lines {
        writeln!(w, "    <Placemark>")?;
        writeln!(w, "      <name>Line {}</name>", line.id)?;
        writeln!(
            w,
            "      <description>Direction: {}\nLength: {:.3} km\nSegments: {}</description>",
            escape_xml(line.direction().as_str()),
            line.length_km(),
            line.line.segment_count
        )?;
        writeln!(w, "      <MultiGeometry>")?;
        for part in &line.line.geometry.0 {
            writeln!(
                w,
                "        <LineString><coordinates>{}</coordinates></LineString>",
                kml_coordinates(&part.0, projection)
            )?;
        }
        writeln!(w, "      </MultiGeometry>")?;
        writeln!(w, "    </Placemark>")?;
    }
    kml_footer(w)
}

/// KML document holding the boundary polygon.
pub fn write_boundary_kml<W: Write>(
    w: &mut W,
    boundary: &BoundaryPolygon,
    projection: &dyn Projection,
) -> std::io::Result<()> {
    kml_header(w, "Polygon")?;
    writeln!(w, "    <Placemark>")?;
    writeln!(w, "      <name>Polygon</name>")?;
    writeln!(
        w,
        "      <description>Area: {:.3} km2 ({:.3} ha)</description>",
        boundary.area_km2(),
        boundary.area_hectares()
    )?;
    writeln!(w, "      <Polygon><outerBoundaryIs><LinearRing>")?;
    writeln!(
        w,
        "        <coordinates>{}</coordinates>",
        kml_coordinates(&boundary.ring().0, projection)
    )?;
    writeln!(w, "      </LinearRing></outerBoundaryIs></Polygon>")?;
    writeln!(w, "    </Placemark>")?;
    kml_footer(w)
}

/// Write the line KML to `path`.
pub fn write_lines_kml_file(
    path: &Path,
    lines: &[OrderedLine],
    projection: &dyn Projection,
) -> Result<()> {
    let mut writer = create(path)?;
    write_lines_kml(&mut writer, lines, projection)
        .and_then(|_| writer.flush())
        .map_err(|e| SurveyError::io(path, e))
}

/// Write the boundary KML to `path`.
pub fn write_boundary_kml_file(
    path: &Path,
    boundary: &BoundaryPolygon,
    projection: &dyn Projection,
) -> Result<()> {
    let mut writer = create(path)?;
    write_boundary_kml(&mut writer, boundary, projection)
        .and_then(|_| writer.flush())
        .map_err(|e| SurveyError::io(path, e))
}
