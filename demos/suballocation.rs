use std::slice;

use rheap::{Block, Heap};

const MEMORY_SIZE: usize = 1024 * 1024;

const WORDS: [&str; 10] = [
  "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten",
];

/// Allocates room for `text` plus a trailing NUL and copies it in.
fn store(
  heap: &mut Heap<'_>,
  text: &str,
) -> Option<Block> {
  let block = heap.allocate(text.len() + 1).ok()?;
  let payload = heap.payload_mut(block).ok()?;

  payload[..text.len()].copy_from_slice(text.as_bytes());
  payload[text.len()] = 0;

  Some(block)
}

fn load<'h>(
  heap: &'h Heap<'_>,
  block: Block,
) -> &'h str {
  let payload = heap.payload(block).unwrap_or_default();
  let end = payload.iter().position(|&byte| byte == 0).unwrap_or(payload.len());

  std::str::from_utf8(&payload[..end]).unwrap_or("<invalid>")
}

fn print_all(
  heap: &Heap<'_>,
  blocks: &[Option<Block>],
) {
  for block in blocks.iter().flatten() {
    println!(
      "'{}' is length {}",
      load(heap, *block),
      heap.payload_size(*block).unwrap_or(0)
    );
  }
}

fn run(region: &mut [u8]) {
  let mut heap = Heap::new();
  if let Err(err) = heap.add_region(region) {
    eprintln!("cannot use region: {}", err);
    return;
  }

  println!("Allocating");

  let mut blocks: Vec<Option<Block>> = Vec::new();
  for word in WORDS {
    println!("Allocating {} bytes for '{}'", word.len() + 1, word);
    blocks.push(store(&mut heap, word));
  }

  println!("\nPrinting from allocations");
  print_all(&heap, &blocks);

  println!("\nRemoving 'Four' and 'Five'");
  for index in [3, 4] {
    if let Err(err) = heap.release(blocks[index].take()) {
      eprintln!("release failed: {}", err);
    }
  }

  println!("Storing 'Eleven' in the freed space");
  blocks[3] = store(&mut heap, "Eleven");

  println!("\nPrinting from allocations");
  print_all(&heap, &blocks);

  println!("\n{}", heap.stats());

  // No need to release the rest: the whole region goes back to the OS.
}

fn main() {
  env_logger::init();

  println!("rheap: suballocation example\n");

  // A megabyte from the OS allocator; the heap only ever borrows it.
  let memory = unsafe { libc::malloc(MEMORY_SIZE) } as *mut u8;
  if memory.is_null() {
    eprintln!("malloc({}) failed", MEMORY_SIZE);
    return;
  }

  // Safety: `memory` is a live allocation of MEMORY_SIZE bytes owned by
  // nobody else, and the slice is gone before `free` runs.
  let region = unsafe { slice::from_raw_parts_mut(memory, MEMORY_SIZE) };
  region.fill(0);
  run(region);

  unsafe { libc::free(memory as *mut libc::c_void) };
}
