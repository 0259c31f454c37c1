//! Outline for simulation list output (`*.lst`).

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::{NodeKind, OutlineNode};
use crate::document::Document;
use crate::reference::ReferenceData;

pub const HEADER_NAME: &str = "MF6-LST";
pub const FAILURE_MARKER: &str = "❌";

static PACKAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\S+)\s*--").unwrap());

static FAILURE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)failed\s+to\s+meet\s+solver\s+convergence\s+criteria|did\s+not\s+converge").unwrap()
});

/// Time step marker formats, tried in order.
static ROW_MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)solving:\s+stress\s+period:?\s+(\d+)(?:\s+time\s+step:?\s+(\d+))?").unwrap(),
        Regex::new(r"(?i)start\s+timestep\s+kper\s*=\s*(\d+)\s+kstp\s*=\s*(\d+)").unwrap(),
    ]
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepMarker {
    pub period: u32,
    pub step: u32,
}

pub fn match_step_marker(line: &str) -> Option<StepMarker> {
    ROW_MARKERS
        .iter()
        .find_map(|re| re.captures(line))
        .and_then(|caps| marker_from(&caps))
}

fn marker_from(caps: &Captures<'_>) -> Option<StepMarker> {
    let period = caps.get(1)?.as_str().parse().ok()?;
    let step = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 1,
    };
    Some(StepMarker { period, step })
}

fn match_package<'a>(line: &'a str, reference: &ReferenceData) -> Option<&'a str> {
    let name = PACKAGE_RE.captures(line)?.get(1)?.as_str();
    reference.is_lst_package(name).then_some(name)
}

/// Header, package sections and stress periods (with their time steps) of a list file.
pub fn scan_listing(doc: &Document<'_>, reference: &ReferenceData) -> Vec<OutlineNode> {
    let line_count = doc.line_count();
    if line_count == 0 {
        return Vec::new();
    }

    let first_marker = (0..line_count).find(|&i| match_step_marker(doc.line(i)).is_some());
    let preamble_end = first_marker.unwrap_or(line_count);

    let mut out = Vec::new();
    let mut i = 0;
    // A marker on the very first line leaves no room for a header.
    if preamble_end > 0 {
        let header_end = section_end(doc, reference, 1, preamble_end);
        out.push(OutlineNode::new(HEADER_NAME, NodeKind::Header, doc.line_span(0, header_end)));
        i = header_end + 1;
    }
    while i < preamble_end {
        match match_package(doc.line(i), reference) {
            Some(name) => {
                let end = section_end(doc, reference, i + 1, preamble_end);
                out.push(OutlineNode::new(name, NodeKind::Package, doc.line_span(i, end)));
                i = end + 1;
            }
            None => i += 1,
        }
    }

    if let Some(start) = first_marker {
        out.extend(scan_stress_periods(doc, start));
    }
    out
}

/// Last line of a header/package region starting before `from`.
fn section_end(doc: &Document<'_>, reference: &ReferenceData, from: usize, limit: usize) -> usize {
    (from..limit)
        .find(|&i| match_package(doc.line(i), reference).is_some())
        .unwrap_or(limit)
        .saturating_sub(1)
}

fn scan_stress_periods(doc: &Document<'_>, start: usize) -> Vec<OutlineNode> {
    let markers: Vec<(usize, StepMarker)> = (start..doc.line_count())
        .filter_map(|i| match_step_marker(doc.line(i)).map(|m| (i, m)))
        .collect();

    let mut periods: Vec<(u32, OutlineNode)> = Vec::new();
    for (idx, &(line, marker)) in markers.iter().enumerate() {
        let end = markers
            .get(idx + 1)
            .map(|&(next, _)| next - 1)
            .unwrap_or(doc.line_count() - 1);
        let step = time_step_node(doc, marker.step, line, end);

        match periods.last_mut() {
            Some((period, node)) if *period == marker.period => {
                node.range.end = step.range.end;
                node.children.push(step);
            }
            _ => {
                let mut node = OutlineNode::new(
                    format!("stress period {}", marker.period),
                    NodeKind::StressPeriod,
                    step.range,
                );
                node.children.push(step);
                periods.push((marker.period, node));
            }
        }
    }
    periods.into_iter().map(|(_, node)| node).collect()
}

fn time_step_node(doc: &Document<'_>, step: u32, start: usize, end: usize) -> OutlineNode {
    let failed = (start..=end).any(|i| FAILURE_RE.is_match(doc.line(i)));
    let name = if failed {
        format!("time step {} {}", step, FAILURE_MARKER)
    } else {
        format!("time step {}", step)
    };
    let mut node = OutlineNode::new(name, NodeKind::TimeStep, doc.line_span(start, end));
    node.failed = failed;
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
                                   MODFLOW 6
                U.S. GEOLOGICAL SURVEY MODULAR HYDROLOGIC MODEL
 Loading simulation
DIS -- STRUCTURED GRID DISCRETIZATION PACKAGE, VERSION 2 : 3/27/2014 - INPUT READ FROM UNIT 1014
 NLAY = 1
 NROW = 10
NOTAPACKAGE -- something else
NPF -- NODE PROPERTY FLOW PACKAGE, VERSION 1, 3/30/2015 INPUT READ FROM UNIT 1015
 CELL CONVERSION:
 Solving:  Stress period:     1    Time step:     1
 OUTER ITERATION SUMMARY
 Solving:  Stress period:     1    Time step:     2
 FAILED TO MEET SOLVER CONVERGENCE CRITERIA
 Solving:  Stress period:     2    Time step:     1
 HEAD WILL BE SAVED";

    fn reference() -> ReferenceData {
        ReferenceData::builtin().unwrap()
    }

    #[test]
    fn test_header_and_packages() {
        let doc = Document::new(LISTING);
        let nodes = scan_listing(&doc, &reference());
        assert_eq!(nodes[0].name, HEADER_NAME);
        assert_eq!(nodes[0].kind, NodeKind::Header);
        assert_eq!((nodes[0].range.start.line, nodes[0].range.end.line), (0, 2));

        assert_eq!(nodes[1].name, "DIS");
        assert_eq!(nodes[1].kind, NodeKind::Package);
        assert_eq!((nodes[1].range.start.line, nodes[1].range.end.line), (3, 6));

        assert_eq!(nodes[2].name, "NPF");
        assert_eq!((nodes[2].range.start.line, nodes[2].range.end.line), (7, 8));
    }

    #[test]
    fn test_stress_periods_group_time_steps() {
        let doc = Document::new(LISTING);
        let nodes = scan_listing(&doc, &reference());
        let periods: Vec<&OutlineNode> = nodes.iter().filter(|n| n.kind == NodeKind::StressPeriod).collect();
        assert_eq!(periods.len(), 2);

        let first = periods[0];
        assert_eq!(first.name, "stress period 1");
        assert_eq!((first.range.start.line, first.range.end.line), (9, 12));
        let steps: Vec<&str> = first.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(steps, vec!["time step 1", "time step 2 ❌"]);
        assert!(!first.children[0].failed);
        assert!(first.children[1].failed);
        assert_eq!((first.children[0].range.start.line, first.children[0].range.end.line), (9, 10));

        let second = periods[1];
        assert_eq!(second.name, "stress period 2");
        assert_eq!((second.range.start.line, second.range.end.line), (13, 14));
    }

    #[test]
    fn test_alternative_marker_format() {
        let text = "header\nstart timestep kper=\"1\" kstp=\"1\"\nstart timestep kper=1 kstp=1\nx\nstart timestep kper=1 kstp=2\nstart timestep kper=3 kstp=1";
        let doc = Document::new(text);
        let nodes = scan_listing(&doc, &reference());
        assert_eq!(nodes[0].range.end.line, 1);
        let periods: Vec<&str> = nodes[1..].iter().map(|n| n.name.as_str()).collect();
        assert_eq!(periods, vec!["stress period 1", "stress period 3"]);
        assert_eq!(nodes[1].children.len(), 2);
        assert_eq!(nodes[1].children[0].range.end.line, 3);
    }

    #[test]
    fn test_marker_without_step_counts_as_first() {
        assert_eq!(
            match_step_marker(" Solving:  Stress period:     4"),
            Some(StepMarker { period: 4, step: 1 })
        );
        assert_eq!(match_step_marker("no marker here"), None);
    }

    #[test]
    fn test_marker_on_first_line_has_no_header() {
        let doc = Document::new(" Solving:  Stress period:     1    Time step:     1\n ok");
        let nodes = scan_listing(&doc, &reference());
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind, NodeKind::StressPeriod);
        assert_eq!((nodes[0].range.start.line, nodes[0].range.end.line), (0, 1));
    }

    #[test]
    fn test_listing_without_markers_is_all_header() {
        let doc = Document::new("line one\nline two");
        let nodes = scan_listing(&doc, &reference());
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].range.end.line, 1);
    }
}
