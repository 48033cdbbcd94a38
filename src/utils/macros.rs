macro_rules! each_tile {
  ($expr:expr) => {
    #[cfg(any(coverage, coverage_nightly, miri))]
    {
      $crate::utils::each_tile!(
        @impl $expr,
        1, 4,
      );
    }

    #[cfg(not(any(coverage, coverage_nightly, miri)))]
    {
      $crate::utils::each_tile!(
        @impl $expr,
        1, 2, 4, 8, 16, 32,
      );
    }
  };
  (@impl $expr:expr, $($lanes:expr),+ $(,)?) => {
    $(
      $crate::utils::each_tile!(@run $expr, $lanes);
    )+
  };
  (@run $expr:expr, $lanes:expr) => {{
    type P = $crate::params::ConstParams::<{ $lanes }, { $lanes }>;
    $expr
  }};
}

pub(crate) use each_tile;
