use chaintable::{buffer::length_first, BucketStats, HashFunction, HashTable};

fn main() -> Result<(), chaintable::TableError> {
    let mut table = HashTable::new(8, HashFunction::Djb2)?;

    table.insert(b"hello", b"world")?;
    table.insert(b"hello", b"again")?;

    let first = table.find(b"hello", length_first)?;
    println!("Value: {:?}", table.get(first).map(|(_, v)| v));
    println!("Entries for hello: {}", table.count(b"hello", length_first)?);

    let stats = BucketStats::from_table(&table);
    println!("Dispersion: {:.3}", stats.dispersion());

    Ok(())
}
