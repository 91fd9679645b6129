mod channels;

use std::thread;
use std::time::Duration;

use anyhow::bail;
use clap::{Parser, Subcommand};
use sps30_lib::{I2cTransport, SerialTransport, Sps30, Transport};

/// Command-line harness for the SPS30 particulate matter sensor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Serial port of the sensor, e.g. /dev/ttyUSB0
    #[arg(long, conflicts_with = "i2c")]
    port: Option<String>,

    /// Linux I2C bus device, e.g. /dev/i2c-1
    #[arg(long)]
    i2c: Option<String>,

    /// Verbose logging (hex dumps of every exchange)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Check that the sensor answers
    Probe,
    /// Switch into measurement mode
    Start,
    /// Return to idle mode
    Stop,
    /// Trigger a fan-cleaning cycle now
    Clean,
    /// Reset the sensor
    Reset,
    /// Start, read measurements, stop
    Read {
        /// Print the record as JSON
        #[arg(long)]
        json: bool,

        /// Keep reading for this many seconds, one record per second
        #[arg(long)]
        watch: Option<u64>,
    },
    /// Print serial number, article code and product name
    Info,
    /// Show the auto-clean interval, or set it when SECONDS is given
    Autoclean { seconds: Option<u32> },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    if let Some(path) = &args.port {
        let channel = channels::PortChannel::open(path)?;
        let sensor = Sps30::new(SerialTransport::new(channel));
        run(sensor, args.command)
    } else if let Some(path) = &args.i2c {
        let channel = channels::LinuxI2c::open(path)?;
        let sensor = Sps30::new(I2cTransport::new(channel));
        run(sensor, args.command)
    } else {
        bail!("select a transport with --port or --i2c");
    }
}

fn run<T: Transport>(mut sensor: Sps30<T>, cmd: Cmd) -> anyhow::Result<()> {
    match cmd {
        Cmd::Probe => {
            if sensor.probe() {
                println!("SPS30 detected");
            } else {
                bail!("no SPS30 answered");
            }
        }
        Cmd::Start => sensor.start()?,
        Cmd::Stop => sensor.stop()?,
        Cmd::Clean => {
            sensor.clean()?;
            println!("fan cleaning triggered (takes about 10 seconds)");
        }
        Cmd::Reset => sensor.reset()?,
        Cmd::Read { json, watch } => {
            sensor.start()?;
            // fan spin-up before the first valid record
            thread::sleep(Duration::from_secs(1));
            let rounds = watch.unwrap_or(1);
            for round in 0..rounds {
                match sensor.measurement() {
                    Ok(record) => {
                        if json {
                            println!("{}", serde_json::to_string(&record)?);
                        } else {
                            print_record(&record);
                        }
                    }
                    Err(err) => eprintln!("read failed: {err}"),
                }
                if round + 1 < rounds {
                    thread::sleep(Duration::from_secs(1));
                }
            }
            sensor.stop()?;
        }
        Cmd::Info => {
            println!("serial number: {}", sensor.serial_number()?);
            println!("article code:  {}", sensor.article_code()?);
            println!("product name:  {}", sensor.product_name()?);
        }
        Cmd::Autoclean { seconds: None } => {
            let interval = sensor.auto_clean_interval()?;
            if interval == 0 {
                println!("auto-clean disabled");
            } else {
                println!("auto-clean every {interval} s");
            }
        }
        Cmd::Autoclean {
            seconds: Some(seconds),
        } => {
            sensor.set_auto_clean_interval(seconds)?;
            println!("auto-clean interval set to {seconds} s");
        }
    }
    Ok(())
}

fn print_record(record: &sps30_lib::Measurement) {
    println!("Mass concentration [µg/m³]:");
    println!("  PM1.0: {:7.2}", record.mass_pm1_0);
    println!("  PM2.5: {:7.2}", record.mass_pm2_5);
    println!("  PM4.0: {:7.2}", record.mass_pm4_0);
    println!("  PM10:  {:7.2}", record.mass_pm10);
    println!("Number concentration [#/cm³]:");
    println!("  PM0.5: {:7.2}", record.number_pm0_5);
    println!("  PM1.0: {:7.2}", record.number_pm1_0);
    println!("  PM2.5: {:7.2}", record.number_pm2_5);
    println!("  PM4.0: {:7.2}", record.number_pm4_0);
    println!("  PM10:  {:7.2}", record.number_pm10);
    println!("Typical particle size: {:.2} µm", record.typical_particle_size);
}
