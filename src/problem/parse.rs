//! Parser for the textual instance format.
//!
//! The format is an OPL-style data file: `name = value;` assignments of
//! scalars, `[..]` vectors, `[[..] [..]]` matrices and `{<..>, <..>}` tuple
//! sets. `/* */` and `//` comments are ignored. Only the shape of the data
//! is checked here; cross references are checked by [`ProblemBuilder`].

use super::builder::ProblemBuilder;
use super::model::Problem;
use super::types::{ComponentId, Link, Server};
use crate::error::ProblemError;
use regex::Regex;

/// Parses an instance description.
///
/// # Examples
///
/// ```
/// let text = "
///     numServers = 1; numVms = 1; numNodes = 1; numRes = 2; numServiceChains = 1;
///     P_max = [100]; P_min = [50]; P = [10];
///     sc = [[1]]; req = [[1] [1]]; av = [[4] [4]]; al = [[1]];
///     Edges = {}; VmDemands = {}; lat = [5];
/// ";
/// let problem = vnf_anneal::problem::parse(text).unwrap();
/// assert_eq!(problem.components_to_place(), &[1]);
/// ```
pub fn parse(text: &str) -> Result<Problem, ProblemError> {
    let text = strip_comments(text)?;

    let num_servers = scalar(&text, "numServers")?;
    let num_vms = scalar(&text, "numVms")?;
    let num_nodes = scalar(&text, "numNodes")?;
    let num_chains = scalar(&text, "numServiceChains")?;

    let p_max = sized(vector(&text, "P_max")?, "P_max", num_servers)?;
    let p_min = sized(vector(&text, "P_min")?, "P_min", num_servers)?;
    let p_node = sized(vector(&text, "P")?, "P", num_nodes)?;
    let lat = sized(vector(&text, "lat")?, "lat", num_chains)?;

    let sc = sized(matrix(&text, "sc")?, "sc", num_chains)?;
    let req = resource_rows(matrix(&text, "req")?, "req", num_vms)?;
    let av = resource_rows(matrix(&text, "av")?, "av", num_servers)?;
    let al = sized(matrix(&text, "al")?, "al", num_servers)?;

    let edges = tuples(&text, "Edges")?;
    let demands = tuples(&text, "VmDemands")?;

    let mut builder = ProblemBuilder::new();
    for power in p_node {
        builder = builder.with_node(power);
    }

    for (s, row) in al.iter().enumerate() {
        let row = sized(row.clone(), "al", num_nodes)?;
        let mut located = row.iter().enumerate().filter(|(_, &v)| v != 0.0);
        let node = match (located.next(), located.next()) {
            (Some((n, _)), None) => n + 1,
            _ => return Err(ProblemError::ServerLocation(s + 1)),
        };
        builder = builder.with_server(Server {
            min_power: p_min[s],
            max_power: p_max[s],
            cpu: av[0][s],
            ram: av[1][s],
            node,
        });
    }

    for c in 0..num_vms {
        builder = builder.with_component(req[0][c], req[1][c]);
    }

    for edge in &edges {
        let [from, to, capacity, power, latency] = fields::<5>(edge, "Edges")?;
        builder = builder.with_link(
            index(from, "Edges")?,
            index(to, "Edges")?,
            Link {
                capacity,
                power,
                latency,
            },
        );
    }

    for demand in &demands {
        let [c1, c2, bandwidth] = fields::<3>(demand, "VmDemands")?;
        builder = builder.with_demand(index(c1, "VmDemands")?, index(c2, "VmDemands")?, bandwidth);
    }

    for (row, &max_latency) in sc.iter().zip(&lat) {
        builder = builder.with_chain(max_latency, chain_components(row, num_vms)?);
    }

    builder.build()
}

/// A row with `num_vms` entries that are all 0/1 is a membership row,
/// ordered by component id. Anything else lists component ids in order.
fn chain_components(row: &[f64], num_vms: usize) -> Result<Vec<ComponentId>, ProblemError> {
    let membership = row.len() == num_vms && row.iter().all(|&v| v == 0.0 || v == 1.0);
    if membership {
        return Ok(row
            .iter()
            .enumerate()
            .filter(|(_, &v)| v == 1.0)
            .map(|(i, _)| i + 1)
            .collect());
    }
    row.iter()
        .filter(|&&v| v != 0.0)
        .map(|&v| index(v, "sc"))
        .collect()
}

fn parse_error(field: &str, reason: impl Into<String>) -> ProblemError {
    ProblemError::Parse {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn regex(field: &str, pattern: &str) -> Result<Regex, ProblemError> {
    Regex::new(pattern).map_err(|e| parse_error(field, e.to_string()))
}

fn strip_comments(text: &str) -> Result<String, ProblemError> {
    let re = regex("comments", r"(?s)/\*.*?\*/|//[^\n]*")?;
    Ok(re.replace_all(text, "").into_owned())
}

fn scalar(text: &str, name: &str) -> Result<usize, ProblemError> {
    let re = regex(name, &format!(r"\b{}\s*=\s*(\d+)\s*;", regex::escape(name)))?;
    let caps = re
        .captures(text)
        .ok_or_else(|| parse_error(name, "missing"))?;
    caps[1]
        .parse()
        .map_err(|e: std::num::ParseIntError| parse_error(name, e.to_string()))
}

/// Raw body between the outer brackets of `name = [...];`.
fn bracketed<'t>(text: &'t str, name: &str) -> Result<&'t str, ProblemError> {
    let re = regex(name, &format!(r"(?s)\b{}\s*=\s*\[(.*?)\]\s*;", regex::escape(name)))?;
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| parse_error(name, "missing"))
}

fn numbers(body: &str, name: &str) -> Result<Vec<f64>, ProblemError> {
    body.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| parse_error(name, format!("`{s}` is not a number")))
        })
        .collect()
}

fn vector(text: &str, name: &str) -> Result<Vec<f64>, ProblemError> {
    let body = bracketed(text, name)?;
    if body.contains('[') {
        return Err(parse_error(name, "expected a vector, found nested brackets"));
    }
    numbers(body, name)
}

fn matrix(text: &str, name: &str) -> Result<Vec<Vec<f64>>, ProblemError> {
    let body = bracketed(text, name)?;
    let row = regex(name, r"\[([^\[\]]*)\]")?;
    row.captures_iter(body)
        .map(|c| numbers(&c[1], name))
        .collect()
}

fn tuples(text: &str, name: &str) -> Result<Vec<Vec<f64>>, ProblemError> {
    let re = regex(name, &format!(r"(?s)\b{}\s*=\s*\{{(.*?)\}}\s*;", regex::escape(name)))?;
    let body = re
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| parse_error(name, "missing"))?;
    let tuple = regex(name, r"<([^<>]*)>")?;
    tuple
        .captures_iter(body)
        .map(|c| numbers(&c[1], name))
        .collect()
}

fn sized<T>(values: Vec<T>, name: &str, expected: usize) -> Result<Vec<T>, ProblemError> {
    if values.len() != expected {
        return Err(parse_error(
            name,
            format!("expected {expected} entries, found {}", values.len()),
        ));
    }
    Ok(values)
}

/// Resource matrices need a CPU row and a RAM row; further rows are ignored.
fn resource_rows(
    rows: Vec<Vec<f64>>,
    name: &str,
    width: usize,
) -> Result<Vec<Vec<f64>>, ProblemError> {
    if rows.len() < 2 {
        return Err(parse_error(name, "expected CPU and RAM rows"));
    }
    rows.into_iter()
        .take(2)
        .map(|row| sized(row, name, width))
        .collect()
}

fn fields<const N: usize>(tuple: &[f64], name: &str) -> Result<[f64; N], ProblemError> {
    tuple
        .try_into()
        .map_err(|_| parse_error(name, format!("expected {N} fields, found {}", tuple.len())))
}

fn index(value: f64, name: &str) -> Result<usize, ProblemError> {
    if value < 1.0 || value.fract() != 0.0 {
        return Err(parse_error(name, format!("`{value}` is not a valid id")));
    }
    Ok(value as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_NODES: &str = include_str!("../../data/three_nodes.txt");

    #[test]
    fn test_parse_sample_instance() {
        let problem = parse(THREE_NODES).unwrap();
        assert_eq!(problem.num_servers(), 4);
        assert_eq!(problem.num_components(), 4);
        assert_eq!(problem.num_nodes(), 3);
        assert_eq!(problem.num_links(), 4);

        let s3 = problem.server(3).unwrap();
        assert_eq!(s3.node, 2);
        assert_eq!(s3.cpu, 16.0);
        assert_eq!(s3.ram, 32.0);
        assert_eq!(s3.min_power, 150.0);

        assert_eq!(problem.component(3).unwrap().ram, 8.0);
        assert_eq!(problem.node_power(2), Some(60.0));
        assert_eq!(problem.link(2, 3).unwrap().capacity, 50.0);
        assert_eq!(problem.demand(3, 4), 10.0);

        let chains = problem.service_chains();
        assert_eq!(chains[0].components, vec![1, 2, 3]);
        assert_eq!(chains[1].components, vec![3, 4]);
        assert_eq!(chains[1].max_latency, 20.0);
    }

    #[test]
    fn test_chain_rows_as_id_lists() {
        assert_eq!(chain_components(&[3.0, 1.0, 2.0], 4).unwrap(), vec![3, 1, 2]);
        assert_eq!(chain_components(&[2.0, 4.0, 0.0, 0.0], 4).unwrap(), vec![2, 4]);
        assert_eq!(chain_components(&[0.0, 1.0, 1.0], 3).unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_comments_are_ignored() {
        let text = THREE_NODES.replace("numVms = 4;", "numVms = 4; // numVms = 9;\n/* numVms = 7; */");
        assert_eq!(parse(&text).unwrap().num_components(), 4);
    }

    #[test]
    fn test_missing_field() {
        let text = THREE_NODES.replace("lat = [20, 20];", "");
        let err = parse(&text).unwrap_err();
        assert!(matches!(err, ProblemError::Parse { ref field, .. } if field == "lat"));
    }

    #[test]
    fn test_wrong_vector_length() {
        let text = THREE_NODES.replace("P = [40, 60, 40];", "P = [40, 60];");
        let err = parse(&text).unwrap_err();
        assert!(matches!(err, ProblemError::Parse { ref field, .. } if field == "P"));
    }

    #[test]
    fn test_server_on_two_nodes() {
        let text = THREE_NODES.replace("[0,0,1]\n];", "[0,1,1]\n];");
        assert_eq!(parse(&text).unwrap_err(), ProblemError::ServerLocation(4));
    }

    #[test]
    fn test_bad_tuple_arity() {
        let text = THREE_NODES.replace("<3,4,10>", "<3,4>");
        let err = parse(&text).unwrap_err();
        assert!(matches!(err, ProblemError::Parse { ref field, .. } if field == "VmDemands"));
    }
}
