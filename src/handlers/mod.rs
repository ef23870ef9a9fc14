pub mod cashcard;
