/// Rounds `$value` up to the next multiple of the machine word.
///
/// Usable in `const` context, which is how the header size is derived.
///
/// # Examples
///
/// ```rust
/// use rheap::align;
///
/// match core::mem::size_of::<usize>() {
///     8 => assert_eq!(align!(20), 24), // 64 bit machine.
///     4 => assert_eq!(align!(18), 20), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + ::core::mem::size_of::<usize>() - 1) & !(::core::mem::size_of::<usize>() - 1)
  };
}
