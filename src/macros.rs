pub use enclose::*;

/// Builds a child sequence: `children!["text", node, ...]`.
#[macro_export]
macro_rules! children {
    ($($child:expr),* $(,)?) => {
        $crate::Children::Nodes(vec![$($crate::Child::from($child)),*])
    };
}

#[macro_export]
macro_rules! handler {
    (( $($d_tt:tt)* ) $args:ident => $($b:tt)*) => {
        $crate::Handler::new($crate::macros::enclose!(($( $d_tt )*) move |$args: &[$crate::Value]| { $($b)* }))
    };
    ($args:ident => $($b:tt)*) => {
        $crate::Handler::new(move |$args: &[$crate::Value]| { $($b)* })
    };
}
