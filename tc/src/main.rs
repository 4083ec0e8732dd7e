#[macro_use]
extern crate clap;

use clap::Arg;
use std::path::Path;

fn main() -> Result<(), tc::Error> {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("Source file to compile; standard input is used if omitted")
                .index(1),
        )
        .get_matches();

    let path = matches.value_of("INPUT").map(Path::new);
    let report = tc::run(path)?;

    println!("(nodes: {}, code: {} bytes)", report.node_count, report.code_len);
    for line in &report.symbol_dump {
        println!("{}", line);
    }
    if report.stack_not_empty {
        eprintln!("-stack not empty-");
    }

    Ok(())
}
