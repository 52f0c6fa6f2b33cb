use tuplestore_core::{Result, StoreBackend, StoreKey};

use crate::Commands;

/// Run one command against an opened backend, printing results to stdout.
pub fn run(command: Commands, backend: &mut dyn StoreBackend) -> Result<()> {
    match command {
        Commands::Get { segments } => {
            let key = StoreKey::new(segments)?;
            println!("{}", backend.get(&key)?);
        }
        Commands::Set { segments, value } => {
            let key = StoreKey::new(segments)?;
            backend.set(&key, &value)?;
        }
        Commands::Has { segments } => {
            let key = StoreKey::new(segments)?;
            println!("{}", backend.has_key(&key)?);
        }
        Commands::Remove { segments } => {
            let key = StoreKey::new(segments)?;
            println!("{}", backend.remove_key(&key)?);
        }
        Commands::List => {
            for line in format_keys(backend.list_keys()?) {
                println!("{line}");
            }
        }
        Commands::Verify => {
            backend.verify_that_key_to_filepath_operation_is_reversible()?;
            println!("ok");
        }
    }
    Ok(())
}

/// Sorted, one line per key, segments separated by tabs.
fn format_keys(mut keys: Vec<StoreKey>) -> Vec<String> {
    keys.sort();
    keys.iter().map(|key| key.join("\t")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_keys_sorted_and_tab_joined() {
        let keys = vec![
            StoreKey::new(["b", "1"]).unwrap(),
            StoreKey::new(["a", "2"]).unwrap(),
            StoreKey::new(["a", "10"]).unwrap(),
        ];
        assert_eq!(format_keys(keys), vec!["a\t10", "a\t2", "b\t1"]);
    }
}
