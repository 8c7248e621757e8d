macro_rules! cfg_doc {
    (
        #[$meta:meta]
        $($item:item)*
    ) => {
        $(
            #[cfg($meta)]
            #[cfg_attr(docsrs, doc(cfg($meta)))]
            $item
        )*
    }
}

macro_rules! cfg_not {
    (
        #[$meta:meta]
        $($item:item)*
    ) => {
        $(
            #[cfg(not($meta))]
            $item
        )*
    }
}

macro_rules! cfg_loom {
    ($($item:item)*) => {
        $(
            #[cfg(loom)]
            $item
        )*
    }
}

macro_rules! cfg_not_loom {
    ($($item:item)*) => {
        $(
            #[cfg(not(loom))]
            $item
        )*
    }
}
