use fatturapa::comuni::ComuniTable;

fn main() {
    env_logger::init();

    // Usage: comuni_lookup <text> [comuni.json]
    let mut args = std::env::args().skip(1);
    let text = args.next().unwrap_or_default();

    let table = ComuniTable::sample();
    if let Some(path) = args.next() {
        let loaded = table
            .spawn_load(path)
            .join()
            .expect("loader thread should not panic");
        match loaded {
            Ok(count) => println!("Caricati {count} comuni"),
            Err(e) => eprintln!("Tabella di esempio in uso: {e}"),
        }
    }

    for name in table.suggestions(&text) {
        match table.lookup(&name) {
            Some(location) => println!(
                "{name} ({}) {}",
                location.province,
                location.postal_code.unwrap_or_default()
            ),
            None => println!("{name}"),
        }
    }
}
