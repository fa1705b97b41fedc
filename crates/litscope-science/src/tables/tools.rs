use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use serde::Deserialize;

use crate::error::Result;
use crate::tables::TableMaps;

/// One tool in the cited-tools JSON, keyed by tool name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CitedTool {
    pub citation_count: u64,
    #[serde(default)]
    pub circumstances: Vec<String>,
    /// Cite key -> circumstances the tool was used in by that paper.
    #[serde(default)]
    pub citations: BTreeMap<String, Vec<String>>,
}

pub fn parse_cited_tools(input: &str) -> Result<BTreeMap<String, CitedTool>> {
    Ok(serde_json::from_str(input)?)
}

fn cited_enough(
    tools: &BTreeMap<String, CitedTool>,
    min_citations: u64,
) -> impl Iterator<Item = (&String, &CitedTool)> {
    tools.iter().filter(move |(name, tool)| {
        let keep = tool.citation_count >= min_citations;
        if !keep {
            tracing::debug!("dropping {name}: {} citation(s)", tool.citation_count);
        }
        keep
    })
}

/// Tool x feature table; a tool gets a cross for every feature one of its
/// circumstances maps to.
pub fn generate_table(input: &str, maps: &TableMaps, min_citations: u64) -> Result<String> {
    let tools = parse_cited_tools(input)?;

    let mut features = BTreeSet::new();
    let mut rows: Vec<(String, BTreeSet<&str>)> = Vec::new();
    for (name, tool) in cited_enough(&tools, min_citations) {
        let mut tool_features = BTreeSet::new();
        for circumstance in &tool.circumstances {
            if let Some(feature) = maps.feature_for(circumstance)? {
                features.insert(feature);
                tool_features.insert(feature);
            }
        }
        rows.push((maps.tool_macro(name)?.into_owned(), tool_features));
    }

    let mut out = String::new();
    let _ = writeln!(out, "\\begin{{tabular}}{{{}}}", "l".repeat(features.len() + 1));
    out.push_str("\\toprule\n\\thead{Tool}\n");
    for feature in &features {
        let _ = write!(out, " & \\theadr{{{feature}}}");
    }
    out.push_str("\\hspace{4em}\\\\\n\\midrule\n");

    for (macro_name, tool_features) in &rows {
        let _ = write!(out, "\\varTool{macro_name}{{}}");
        for feature in &features {
            out.push_str(if tool_features.contains(feature) { " & \\cross" } else { " & " });
        }
        out.push_str("\\\\\n");
    }

    out.push_str("\\bottomrule\n\\end{tabular}\n");
    Ok(out)
}

type CircumstanceTools<'a> = BTreeMap<&'a str, BTreeMap<&'a str, BTreeSet<&'a str>>>;

/// Indented listing: feature, then circumstance (with an `Any` bucket), then
/// each tool with the papers citing it for that circumstance.
pub fn list_features(input: &str, maps: &TableMaps, min_citations: u64) -> Result<String> {
    let tools = parse_cited_tools(input)?;

    let mut by_feature: BTreeMap<&str, CircumstanceTools> = BTreeMap::new();
    for (name, tool) in cited_enough(&tools, min_citations) {
        for (cite_key, circumstances) in &tool.citations {
            for circumstance in circumstances {
                let Some(feature) = maps.feature_for(circumstance)? else {
                    continue;
                };
                let buckets = by_feature.entry(feature).or_default();
                for bucket in ["Any", circumstance.as_str()] {
                    buckets
                        .entry(bucket)
                        .or_default()
                        .entry(name.as_str())
                        .or_default()
                        .insert(cite_key.as_str());
                }
            }
        }
    }

    let mut out = String::new();
    for (feature, buckets) in &by_feature {
        let _ = writeln!(out, "{feature}:");
        for (circumstance, tool_citations) in buckets {
            let _ = writeln!(out, "\t{circumstance}:");
            for (name, cite_keys) in tool_citations {
                let keys: Vec<&str> = cite_keys.iter().copied().collect();
                let _ = writeln!(out, "\t\t{name} \\cite{{{}}}", keys.join(", "));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScienceError;
    use litscope_core::UnmappedPolicy;

    const TOOLS: &str = r#"{
        "Ghidra": {"citation_count": 3, "circumstances": ["Decompilation", "Emulation", "Binary Lifting"]},
        "IDA Pro": {"citation_count": 5, "circumstances": ["Instruction Boundaries"]},
        "Hopper": {"citation_count": 1, "circumstances": ["Time Travel"]}
    }"#;

    #[test]
    fn test_generate_table() {
        let maps = TableMaps::builtin().unwrap();
        let out = generate_table(TOOLS, &maps, 2).unwrap();
        assert_eq!(
            out,
            "\\begin{tabular}{llll}\n\
             \\toprule\n\
             \\thead{Tool}\n\
             \x20& \\theadr{Binary Lifting} & \\theadr{Decompilation} & \\theadr{Disassembly}\\hspace{4em}\\\\\n\
             \\midrule\n\
             \\varToolGhidra{} & \\cross & \\cross & \\\\\n\
             \\varToolIDAPro{} &  &  & \\cross\\\\\n\
             \\bottomrule\n\
             \\end{tabular}\n"
        );
    }

    #[test]
    fn test_generate_table_unknown_tool() {
        let maps = TableMaps::builtin().unwrap();
        let input = r#"{"Hopper": {"citation_count": 2, "circumstances": ["Disassembly"]}}"#;
        assert!(matches!(
            generate_table(input, &maps, 2),
            Err(ScienceError::UndefinedAlias { .. })
        ));

        let lenient = maps.with_policy(UnmappedPolicy::Passthrough);
        let out = generate_table(input, &lenient, 2).unwrap();
        assert!(out.contains("\\varToolHopper{} & \\cross\\\\"));
    }

    #[test]
    fn test_list_features() {
        let maps = TableMaps::builtin().unwrap();
        let input = r#"{
            "Angr": {"citation_count": 2, "citations": {
                "binrec": ["Binary Lifting to LLVM IR"],
                "sok": ["Binary Lifting", "Data Mining"]
            }},
            "BAP": {"citation_count": 2, "citations": {"hext5": ["Binary Lifting"]}},
            "Pin": {"citation_count": 1, "citations": {"juice": ["Binary Lifting"]}}
        }"#;
        let out = list_features(input, &maps, 2).unwrap();
        assert_eq!(
            out,
            "Binary Lifting:\n\
             \tAny:\n\
             \t\tAngr \\cite{binrec, sok}\n\
             \t\tBAP \\cite{hext5}\n\
             \tBinary Lifting:\n\
             \t\tAngr \\cite{sok}\n\
             \t\tBAP \\cite{hext5}\n\
             \tBinary Lifting to LLVM IR:\n\
             \t\tAngr \\cite{binrec}\n"
        );
    }
}
