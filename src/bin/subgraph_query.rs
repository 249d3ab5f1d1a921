use gbwtgraph::{GBZ, PathIndex, Subgraph, SubgraphQuery, HaplotypeOutput};
use gbwtgraph::{FullPathName, REF_SAMPLE};

use getopts::Options;

use simple_sds::serialize;

use std::ops::Range;
use std::time::Instant;
use std::{env, io, process};

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let start_time = Instant::now();

    // Parse arguments.
    let config = Config::new()?;

    // Load the graph.
    let graph: GBZ = serialize::load_from(&config.filename).map_err(|err| err.to_string())?;

    // Build the query and a possible path index.
    let query = config.query()?;
    let path_index = match &config.query_type {
        QueryArgument::Node(_) => None,
        _ => Some(PathIndex::new(&graph, PathIndex::DEFAULT_INTERVAL, false)?),
    };

    // Extract the subgraph and write it out.
    let subgraph = Subgraph::from_gbz(&graph, path_index.as_ref(), &query)?;
    let mut output = io::stdout();
    subgraph.write_gfa(&mut output).map_err(|err| err.to_string())?;

    let seconds = start_time.elapsed().as_secs_f64();
    eprintln!("Used {:.3} seconds", seconds);

    Ok(())
}

//-----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
enum QueryArgument {
    Node(usize),
    Offset(usize),
    Interval(Range<usize>),
}

struct Config {
    filename: String,
    sample: String,
    contig: Option<String>,
    query_type: QueryArgument,
    context: usize,
    output: HaplotypeOutput,
}

impl Config {
    fn new() -> Result<Config, String> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optopt("", "sample", "sample name for the reference path", "NAME");
        opts.optopt("", "contig", "contig name (required with --offset and --interval)", "NAME");
        opts.optopt("", "offset", "query a reference path at offset N bp", "N");
        opts.optopt("", "interval", "query a reference path over interval [M, N)", "M..N");
        opts.optopt("", "node", "query a node with identifier N", "N");
        let context_desc = format!("context length around the query position in bp (default: {})", SubgraphQuery::DEFAULT_CONTEXT);
        opts.optopt("", "context", &context_desc, "N");
        opts.optflag("", "distinct", "output distinct haplotypes with weights");
        opts.optflag("", "reference-only", "output only the reference path");
        let matches = opts.parse(&args[1..]).map_err(|err| err.to_string())?;

        if matches.opt_present("help") {
            let header = format!("Usage: {} [options] graph.gbz", program);
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }
        let filename = match matches.free.first() {
            Some(name) => name.clone(),
            None => {
                let header = format!("Usage: {} [options] graph.gbz", program);
                eprint!("{}", opts.usage(&header));
                process::exit(1);
            }
        };

        let sample = matches.opt_str("sample").unwrap_or(String::from(REF_SAMPLE));
        let contig = matches.opt_str("contig");

        // The query flags are mutually exclusive, and the last one wins.
        // Both `--flag value` and `--flag=value` count as the flag.
        let last_flag = args.iter().rev().find_map(|arg| {
            let name = arg.split('=').next().unwrap_or(arg.as_str());
            if matches!(name, "--node" | "--offset" | "--interval") {
                Some(name)
            } else {
                None
            }
        });
        let query_type = match last_flag {
            Some("--node") => {
                let value = matches.opt_str("node").ok_or(String::from("--node requires a node identifier"))?;
                QueryArgument::Node(value.parse::<usize>().map_err(|err| format!("--node: {}", err))?)
            }
            Some("--offset") => {
                let value = matches.opt_str("offset").ok_or(String::from("--offset requires an offset"))?;
                QueryArgument::Offset(value.parse::<usize>().map_err(|err| format!("--offset: {}", err))?)
            }
            Some("--interval") => {
                let value = matches.opt_str("interval").ok_or(String::from("--interval requires an interval"))?;
                QueryArgument::Interval(Self::parse_interval(&value)?)
            }
            _ => return Err(String::from("A path offset, a path interval, or a node identifier is required")),
        };

        if matches!(query_type, QueryArgument::Offset(_) | QueryArgument::Interval(_)) && contig.is_none() {
            return Err(String::from("Contig name is required for path offset and interval queries"));
        }

        let context = match matches.opt_str("context") {
            Some(value) => value.parse::<usize>().map_err(|err| format!("--context: {}", err))?,
            None => SubgraphQuery::DEFAULT_CONTEXT,
        };

        let mut output = HaplotypeOutput::All;
        if matches.opt_present("distinct") {
            output = HaplotypeOutput::Distinct;
        }
        if matches.opt_present("reference-only") {
            output = HaplotypeOutput::ReferenceOnly;
        }

        Ok(Config { filename, sample, contig, query_type, context, output })
    }

    fn parse_interval(string: &str) -> Result<Range<usize>, String> {
        let mut parts = string.split("..");
        let start = parts.next().ok_or(format!("Invalid interval: {}", string))?;
        let start = start.parse::<usize>().map_err(|err| format!("--interval: {}", err))?;
        let end = parts.next().ok_or(format!("Invalid interval: {}", string))?;
        let end = end.parse::<usize>().map_err(|err| format!("--interval: {}", err))?;
        if parts.next().is_some() || start >= end {
            return Err(format!("Invalid interval: {}", string));
        }
        Ok(start..end)
    }

    fn path_name(&self) -> FullPathName {
        FullPathName::haplotype(&self.sample, self.contig.as_deref().unwrap_or(""), 0, 0)
    }

    fn query(&self) -> Result<SubgraphQuery, String> {
        let query = match &self.query_type {
            QueryArgument::Node(node_id) => SubgraphQuery::node(*node_id),
            QueryArgument::Offset(offset) => SubgraphQuery::path_offset(&self.path_name(), *offset),
            QueryArgument::Interval(interval) => SubgraphQuery::path_interval(&self.path_name(), interval.clone()),
        };
        Ok(query.with_context(self.context).with_output(self.output))
    }
}

//-----------------------------------------------------------------------------
