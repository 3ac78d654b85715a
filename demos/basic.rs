use rheap::Heap;

/// Requests made against a 64 KiB buffer; the last one cannot fit.
const SIZES: [usize; 6] = [150, 256, 512, 100, 1024, 65536];

fn main() {
  env_logger::init();

  println!("rheap: basic example\n");

  // On an embedded target this would be a static region at a fixed address.
  let mut buffer = vec![0u8; 65536];
  let mut heap = Heap::new();

  if let Err(err) = heap.add_region(&mut buffer) {
    eprintln!("cannot use buffer: {}", err);
    return;
  }

  let mut blocks = Vec::new();

  for size in SIZES {
    println!("Allocating {} bytes...", size);

    match heap.allocate(size) {
      Ok(block) => blocks.push(block),
      Err(err) => println!("  failed as expected: {}", err),
    }
  }

  println!("\n{}", heap.stats());

  // ...use the memory...

  println!("\nReleasing");
  for block in blocks {
    if let Err(err) = heap.release(Some(block)) {
      eprintln!("  release failed: {}", err);
    }
  }

  println!("{}", heap.stats());
  println!("Done");
}
