// Example walking a stream of JSON documents with a Cursor over a ChunkSource

use lazyjson::{ChunkSource, Child, Cursor, Error};

fn main() -> Result<(), Error> {
    println!("🚀 Cursor Demo with ChunkSource");
    println!("===============================");

    let json = br#"
        // First reading
        {"sensor": "north", "values": [1, 2.5, true, null], "count": 4,}
        // Second reading
        {"sensor": "south", "values": [], "count": 0}
        ["a", "plain", "array"]
    "#;

    println!("📏 Total size: {} bytes", json.len());
    println!("   Chunk size: 8 bytes (simulates small network packets)");
    println!();

    let mut cursor = Cursor::new(ChunkSource::new(json, 8))?;
    loop {
        println!("📦 Value #{} ({}) at byte {}", cursor.value_index(), cursor.kind(), cursor.start());
        if cursor.is_object() {
            if let Ok(sensor) = cursor.index("sensor") {
                println!("  🔑 sensor = {:?}", sensor.value()?);
            }
            println!("  📋 values has {} entries", cursor.index("values")?.len()?);
        }
        for child in cursor.iter()? {
            match child? {
                Child::Key(key) => println!("  🔑 Key: '{key}'"),
                Child::Element(node) => println!("  📝 Element: {:?}", node.value()?),
            }
        }

        match cursor.advance() {
            Ok(()) => {}
            Err(Error::StreamExhausted) => break,
            Err(e) => return Err(e),
        }
    }

    println!();
    println!("✅ Read {} values", cursor.value_index() + 1);
    Ok(())
}
