use std::path::PathBuf;
use std::process;

use structopt::StructOpt;

use phpipam_sdb::{logger, resolver, ConfigStore, Result, SdbUri};

/// Print the addresses {php}IPAM knows for a hostname, one
/// `ip:netmask:description:subnetId` line each.
#[derive(Debug, StructOpt)]
#[structopt(name = "phpipam-sdb")]
struct Opt {
    /// YAML file holding the connection profiles
    #[structopt(short, long, default_value = "/etc/salt/master", parse(from_os_str))]
    config: PathBuf,

    /// Profile to use when KEY is a bare hostname
    #[structopt(short, long, default_value = "phpipam")]
    profile: String,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,

    /// Hostname, or an sdb://<profile>/<hostname> uri
    key: String,
}

fn run(opt: &Opt) -> Result<String> {
    let (profile_name, key) = if SdbUri::is_sdb(&opt.key) {
        let uri = SdbUri::parse(&opt.key)?;
        (uri.profile, uri.key)
    } else {
        (opt.profile.clone(), opt.key.clone())
    };

    let store = ConfigStore::from_file(&opt.config)?;
    let profile = store.profile(&profile_name)?;
    log::info!("looking up {} with profile {}", key, profile_name);

    resolver::get(&profile, &key)
}

fn main() {
    let opt = Opt::from_args();

    if let Err(e) = logger::init(logger::level_from_verbosity(opt.verbose)) {
        eprintln!("could not set up logging: {}", e);
    }

    match run(&opt) {
        Ok(found) => {
            // hostname unknown to phpIPAM: print nothing
            if !found.is_empty() {
                println!("{}", found);
            }
        }
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    }
}
