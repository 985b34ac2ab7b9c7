use anyhow::Result;
use sdict::config::OpenConfig;
use sdict::DictionaryFile;
use std::io::{self, Write};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data.sdict".to_string());
    let mut dict = DictionaryFile::open(&path, &OpenConfig::default())?;
    println!("--- {} loaded, {} words ---", path, dict.num_words());
    println!("Commands: find [word], contains [word], add [word] [definition...], flush, exit");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let parts: Vec<&str> = input.trim().split_whitespace().collect();

        match parts.as_slice() {
            ["find", word] => match dict.find(word.as_bytes(), false)? {
                Some(def) => println!("{}", String::from_utf8_lossy(&def)),
                None => println!("(not found)"),
            },
            ["contains", word] => {
                println!("{}", dict.contains(word.as_bytes()));
            }
            ["add", word, def @ ..] if !def.is_empty() => {
                if dict.add_word(word.as_bytes(), def.join(" ").as_bytes())? {
                    println!("OK");
                } else {
                    println!("(already present)");
                }
            }
            ["flush"] => {
                dict.flush()?;
                println!("Flush complete.");
            }
            ["exit"] => break,
            _ => println!("Unknown command."),
        }
    }

    dict.close()?;
    Ok(())
}
