use clap::Args;
use niche_core::domain::contract::round2;
use niche_core::scoring::generate_domain_candidates;

const DEFAULT_TLDS: [&str; 5] = ["com", "org", "net", "io", "co"];

#[derive(Debug, Args)]
pub struct DomainsArgs {
    /// Keyword to derive names from.
    #[arg(long, short = 'k')]
    keyword: String,

    /// TLDs to try; repeat for several. Defaults to com, org, net, io, co.
    #[arg(long = "tld")]
    tlds: Vec<String>,

    #[arg(long, default_value_t = 10)]
    limit: usize,
}

pub fn run(args: DomainsArgs) -> anyhow::Result<()> {
    let tlds: Vec<&str> = if args.tlds.is_empty() {
        DEFAULT_TLDS.to_vec()
    } else {
        args.tlds.iter().map(String::as_str).collect()
    };

    let candidates = generate_domain_candidates(&args.keyword, &tlds, args.limit);
    anyhow::ensure!(
        !candidates.is_empty(),
        "no domain candidates for keyword {:?}",
        args.keyword
    );

    tracing::info!(keyword = %args.keyword, count = candidates.len(), "domain candidates scored");

    let out: Vec<serde_json::Value> = candidates
        .iter()
        .map(|c| {
            serde_json::json!({
                "domain": c.fqdn(),
                "name": c.name,
                "tld": c.tld,
                "score": round2(c.score),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
