use clap::{Parser, Subcommand};
use colored_json::{Color, ColorMode, Output, Styler, ToColoredJson};
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tcf_consent::store::{ADDITIONAL_CONSENT, GDPR_APPLIES, MemoryStore, TC_STRING};
use tcf_consent::tc_string::TcString;
use tcf_consent::{ConsentHelper, ConsentPolicy};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log filter, for example `debug` or `tcf_consent=debug`
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a TC string and display all its fields
    Decode {
        /// TC string to decode
        tc_string: String,
    },
    /// Evaluate the ad and analytics consent policy for a TC string
    Check {
        /// TC string to evaluate
        tc_string: String,
        /// Value of IABTCF_gdprApplies (1 or 0), unknown when not given
        #[arg(short, long)]
        gdpr: Option<String>,
        /// Additional consent string
        #[arg(short, long)]
        additional_consent: Option<String>,
        /// Policy file in TOML format
        #[arg(short, long)]
        policy: Option<PathBuf>,
        /// Vendor IDs to check authorization for
        #[arg(short, long)]
        vendor: Vec<u16>,
        /// External provider IDs to check authorization for
        #[arg(short, long)]
        external: Vec<u16>,
    },
}

#[derive(Serialize)]
struct Report {
    gdpr: bool,
    can_show_ads: bool,
    can_show_personalized_ads: bool,
    ad_storage: bool,
    ad_personalization: bool,
    ad_user_data: bool,
    purpose_consents: String,
    purpose_legitimate_interests: String,
    additional_consent: String,
    vendors: Vec<Authorization>,
    external: Vec<Authorization>,
    outdated: bool,
}

#[derive(Serialize)]
struct Authorization {
    id: u16,
    authorized: bool,
}

fn main() {
    let args = Cli::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let e = match args.cmd {
        Commands::Decode { tc_string } => decode_tc_string(&tc_string),
        Commands::Check {
            tc_string,
            gdpr,
            additional_consent,
            policy,
            vendor,
            external,
        } => check_tc_string(
            &tc_string,
            gdpr,
            additional_consent,
            policy.as_deref(),
            &vendor,
            &external,
        ),
    };

    if let Err(e) = e {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn decode_tc_string(s: &str) -> Result<(), Box<dyn Error>> {
    let tc = TcString::from_str(s)?;
    print_json(&tc)
}

fn check_tc_string(
    s: &str,
    gdpr: Option<String>,
    additional_consent: Option<String>,
    policy: Option<&Path>,
    vendors: &[u16],
    external: &[u16],
) -> Result<(), Box<dyn Error>> {
    let policy = match policy {
        Some(path) => load_policy(path)?,
        None => ConsentPolicy::default(),
    };

    let mut store = MemoryStore::new().with(TC_STRING, s);
    if let Some(gdpr) = gdpr {
        store = store.with(GDPR_APPLIES, gdpr);
    }
    if let Some(ac) = additional_consent {
        store = store.with(ADDITIONAL_CONSENT, ac);
    }

    let mut helper = ConsentHelper::new(store, policy);

    // surface decoding errors, the helper itself would only deny consent
    helper.consent_view()?;

    let mut report = Report {
        gdpr: helper.is_gdpr(),
        can_show_ads: helper.can_show_ads(),
        can_show_personalized_ads: helper.can_show_personalized_ads(),
        ad_storage: helper.ad_storage(),
        ad_personalization: helper.ad_personalization(),
        ad_user_data: helper.ad_user_data(),
        purpose_consents: helper.purpose_consents(),
        purpose_legitimate_interests: helper.purpose_legitimate_interests(),
        additional_consent: helper.additional_consent(),
        vendors: vendors
            .iter()
            .map(|&id| Authorization {
                id,
                authorized: helper.is_vendor_authorized(id),
            })
            .collect(),
        external: external
            .iter()
            .map(|&id| Authorization {
                id,
                authorized: helper.is_external_authorized(id),
            })
            .collect(),
        outdated: false,
    };
    report.outdated = helper.delete_outdated_tc_string();

    print_json(&report)
}

fn load_policy(path: &Path) -> Result<ConsentPolicy, Box<dyn Error>> {
    debug!(path = %path.display(), "loading policy");
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!(
        "{}",
        serde_json::to_string_pretty(value)?
            .to_colored_json_with_styler(ColorMode::Auto(Output::StdOut), json_color_styler())?
    );

    Ok(())
}

fn json_color_styler() -> Styler {
    Styler {
        key: Color::Green.foreground(),
        string_value: Color::Blue.bold(),
        integer_value: Color::Magenta.bold(),
        float_value: Color::Magenta.italic(),
        object_brackets: Color::Yellow.bold(),
        array_brackets: Color::Cyan.bold(),
        ..Default::default()
    }
}
