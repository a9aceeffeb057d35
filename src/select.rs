mod navigator;


pub use navigator::SelectionNavigator;
